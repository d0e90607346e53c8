#![no_main]

use libfuzzer_sys::fuzz_target;
use scandata_export::FilterRequest;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = FilterRequest::from_json(s);
    }
});
