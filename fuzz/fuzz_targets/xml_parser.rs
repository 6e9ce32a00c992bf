#![no_main]
use libfuzzer_sys::fuzz_target;
use zmedia::XmlParser;

fuzz_target!(|data: &[u8]| {
    let mut parser = XmlParser::new(data);
    let _ = parser.parse();
});
