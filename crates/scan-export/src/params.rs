//! 호출 파라미터 디코딩
//!
//! 스케줄러는 느슨한 key/value 맵([`JobParameters`])으로 작업을 호출합니다.
//! 이 모듈은 경계에서 한 번만 맵을 검사해 타입이 있는 [`JobParams`]로 바꾸며,
//! 이후 파이프라인은 동적 값을 다시 보지 않습니다.
//!
//! | 키 | 필수 | 형식 |
//! |---|---|---|
//! | `mode` | O | 문자열 `"export"` |
//! | `JobId` | O | 0 이상의 정수 값 (`42`, `42.0`) |
//! | `Request` | X | [`FilterRequest`] 형식의 객체 |

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use scandata_core::job::JobParameters;
use scandata_core::types::ExecutionId;

use crate::error::ExportError;
use crate::types::FilterRequest;

/// 실행 모드 파라미터 키
pub const MODE_KEY: &str = "mode";
/// 실행 ID 파라미터 키
pub const JOB_ID_KEY: &str = "JobId";
/// 필터 조건 파라미터 키
pub const REQUEST_KEY: &str = "Request";

/// 부동소수점으로 정확히 표현 가능한 최대 정수 (2^53)
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// 작업 실행 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    /// 스캔 데이터 내보내기
    Export,
}

impl JobMode {
    /// 파라미터 문자열 표현
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Export => "export",
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobMode {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "export" => Ok(Self::Export),
            other => Err(ExportError::invalid(
                MODE_KEY,
                format!("unsupported mode '{other}'"),
            )),
        }
    }
}

/// 검증된 호출 파라미터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobParams {
    /// 실행 모드
    pub mode: JobMode,
    /// 실행 레코드 ID
    pub job_id: ExecutionId,
    /// 필터 조건 (없으면 전체 내보내기)
    pub request: Option<FilterRequest>,
}

impl JobParams {
    /// 내보내기 호출 파라미터를 생성합니다.
    pub fn export(job_id: ExecutionId, request: Option<FilterRequest>) -> Self {
        Self {
            mode: JobMode::Export,
            job_id,
            request,
        }
    }

    /// 스케줄러 파라미터 맵을 디코딩합니다.
    ///
    /// # Errors
    ///
    /// 필수 키가 없거나 형식이 잘못되면 `ExportError::InvalidInvocation`
    pub fn decode(params: &JobParameters) -> Result<Self, ExportError> {
        let mode = match params.get(MODE_KEY) {
            Some(Value::String(s)) => s.parse::<JobMode>()?,
            Some(other) => {
                return Err(ExportError::invalid(
                    MODE_KEY,
                    format!("expected string, got {}", kind_of(other)),
                ));
            }
            None => return Err(ExportError::invalid(MODE_KEY, "missing")),
        };

        let job_id = match params.get(JOB_ID_KEY) {
            Some(value) => decode_job_id(value)?,
            None => return Err(ExportError::invalid(JOB_ID_KEY, "missing")),
        };

        let request = params
            .get(REQUEST_KEY)
            .map(FilterRequest::from_value)
            .transpose()?;

        Ok(Self {
            mode,
            job_id,
            request,
        })
    }

    /// 파라미터 맵으로 다시 인코딩합니다.
    ///
    /// 필터 조건을 인코딩하지 못하면 조건 없이 반환하지 않고 에러를 돌려줍니다.
    pub fn to_parameters(&self) -> Result<JobParameters, ExportError> {
        let mut params = JobParameters::new();
        params.insert(MODE_KEY.to_owned(), Value::from(self.mode.as_str()));
        params.insert(JOB_ID_KEY.to_owned(), Value::from(self.job_id.get()));
        if let Some(request) = &self.request {
            let value = serde_json::to_value(request)
                .map_err(|e| ExportError::invalid(REQUEST_KEY, format!("cannot encode: {e}")))?;
            params.insert(REQUEST_KEY.to_owned(), value);
        }
        Ok(params)
    }
}

impl FilterRequest {
    /// JSON 문자열에서 필터 조건을 파싱합니다.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ExportError::invalid(REQUEST_KEY, format!("malformed criteria: {e}")))?;
        Self::from_value(&value)
    }

    /// 동적 JSON 값에서 필터 조건을 디코딩합니다. 값은 객체여야 합니다.
    pub fn from_value(value: &Value) -> Result<Self, ExportError> {
        if !value.is_object() {
            return Err(ExportError::invalid(
                REQUEST_KEY,
                format!("malformed criteria: expected object, got {}", kind_of(value)),
            ));
        }
        Self::deserialize(value)
            .map_err(|e| ExportError::invalid(REQUEST_KEY, format!("malformed criteria: {e}")))
    }
}

fn decode_job_id(value: &Value) -> Result<ExecutionId, ExportError> {
    let Value::Number(number) = value else {
        return Err(ExportError::invalid(
            JOB_ID_KEY,
            format!("expected number, got {}", kind_of(value)),
        ));
    };

    if let Some(id) = number.as_i64() {
        return if id >= 0 {
            Ok(ExecutionId(id))
        } else {
            Err(ExportError::invalid(JOB_ID_KEY, format!("negative id {id}")))
        };
    }

    if number.as_u64().is_some() {
        return Err(ExportError::invalid(JOB_ID_KEY, format!("id {number} out of range")));
    }

    match number.as_f64() {
        // 범위와 정수성을 확인했으므로 손실 없는 변환
        Some(f) if f.fract() == 0.0 && (0.0..=MAX_EXACT_F64_INT).contains(&f) => {
            Ok(ExecutionId(f as i64))
        }
        _ => Err(ExportError::invalid(
            JOB_ID_KEY,
            format!("expected non-negative integer, got {number}"),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
