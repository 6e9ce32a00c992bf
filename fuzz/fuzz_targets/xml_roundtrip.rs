#![no_main]
use libfuzzer_sys::fuzz_target;
use zmedia::Document;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(doc) = Document::read(s) {
            for formatted in [false, true] {
                let xml = doc.to_xml(formatted);
                let reparsed = Document::read(&xml);
                assert_eq!(reparsed.as_ref(), Some(&doc), "roundtrip changed tree");
                assert_eq!(reparsed.map(|d| d.to_xml(formatted)), Some(xml));
            }
        }
    }
});
