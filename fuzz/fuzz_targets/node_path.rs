#![no_main]
use libfuzzer_sys::fuzz_target;
use zmedia::Document;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let (path, value) = s.split_once('=').unwrap_or((s, ""));
        if let Some(mut doc) = Document::new("Root") {
            if doc.set_node_path_value(path, value).is_ok() {
                assert_eq!(doc.node_path_value(path), Some(value));
                let _ = Document::parse(&doc.to_xml(true));
            }
        }
    }
});
