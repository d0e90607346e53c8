#![no_main]

use libfuzzer_sys::fuzz_target;
use scandata_export::ContentDigest;

fuzz_target!(|data: &str| {
    // 파싱에 성공한 다이제스트는 표시 형식이 입력과 같아야 함
    if let Ok(digest) = data.parse::<ContentDigest>() {
        assert_eq!(digest.to_string(), data);
    }
});
