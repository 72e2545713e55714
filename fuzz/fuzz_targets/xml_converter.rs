#![no_main]
use libfuzzer_sys::fuzz_target;
use xml2json::convert_bytes;

fuzz_target!(|data: &[u8]| {
    match convert_bytes(data) {
        Ok(json) => assert!(json.starts_with('{') && json.ends_with('}')),
        Err(err) => assert!(err.is_malformed(), "unexpected error kind: {:?}", err.kind()),
    }
});
