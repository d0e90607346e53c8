#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

use scandata_core::job::JobParameters;
use scandata_export::JobParams;
use scandata_export::params::{JOB_ID_KEY, MODE_KEY, REQUEST_KEY};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    mode: Option<FuzzScalar>,
    job_id: Option<FuzzScalar>,
    /// Request 값 (JSON 텍스트, 파싱 실패 시 문자열로 삽입)
    request: Option<String>,
}

#[derive(Arbitrary, Debug)]
enum FuzzScalar {
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl FuzzScalar {
    fn into_value(self) -> Value {
        match self {
            Self::Int(v) => Value::from(v),
            Self::Uint(v) => Value::from(v),
            Self::Float(v) => Value::from(v),
            Self::Text(v) => Value::String(v),
            Self::Bool(v) => Value::Bool(v),
            Self::Null => Value::Null,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let mut params = JobParameters::new();
    if let Some(mode) = input.mode {
        params.insert(MODE_KEY.to_owned(), mode.into_value());
    }
    if let Some(job_id) = input.job_id {
        params.insert(JOB_ID_KEY.to_owned(), job_id.into_value());
    }
    if let Some(request) = input.request {
        let value = serde_json::from_str(&request).unwrap_or(Value::String(request));
        params.insert(REQUEST_KEY.to_owned(), value);
    }

    // 디코딩에 성공한 파라미터는 맵으로 되돌려도 같은 값으로 디코딩되어야 함
    if let Ok(decoded) = JobParams::decode(&params) {
        assert!(decoded.job_id.get() >= 0);
        let again = JobParams::decode(&decoded.to_parameters().expect("encode")).expect("re-decode");
        assert_eq!(again, decoded);
    }
});
