//! 내보내기 도메인 타입
//!
//! - 식별자: [`ProjectId`], [`RepositoryId`], [`ArtifactId`], [`SystemArtifactId`]
//! - 필터 조건: [`FilterRequest`]
//! - CSV 행: [`ScanDataRow`]
//! - 다이제스트: [`ContentDigest`]
//! - 저장 레코드: [`SystemArtifactRecord`], [`ExecutionRecord`]
//! - 결과: [`ExportScope`], [`ExportOutcome`], [`ExportSummary`]

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use scandata_core::types::ExecutionId;

use crate::error::ExportError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// 프로젝트 식별자
    ProjectId
);
id_type!(
    /// 리포지토리 식별자
    RepositoryId
);
id_type!(
    /// 아티팩트 식별자
    ArtifactId
);
id_type!(
    /// 시스템 아티팩트 저장소가 발급한 레코드 식별자
    SystemArtifactId
);

/// 사용자가 지정한 내보내기 필터 조건
///
/// 호출 파라미터 `Request` 객체를 그대로 역직렬화합니다.
/// 알 수 없는 키는 무시하고, 빠진 키는 빈 값으로 채웁니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterRequest {
    /// 요청한 사용자 (프로젝트 조건이 비었을 때 관리 프로젝트 해석에 사용)
    pub user_name: String,
    /// 프로젝트 이름 집합 (비어 있으면 사용자가 관리하는 프로젝트)
    pub projects: BTreeSet<String>,
    /// 리포지토리 이름 집합 (비어 있으면 제약 없음)
    pub repositories: BTreeSet<String>,
    /// 태그 집합 (비어 있으면 제약 없음)
    pub tags: BTreeSet<String>,
    /// 라벨 집합 (비어 있으면 제약 없음)
    pub labels: BTreeSet<String>,
    /// CVE ID 집합 (비어 있으면 제약 없음)
    pub cve_ids: BTreeSet<String>,
}

/// CSV 한 행에 해당하는 스캔 데이터 레코드
///
/// 직렬화 시 필드 이름은 CSV 헤더가 되며, 필드 선언 순서가 열 순서입니다.
/// 역직렬화는 snake_case 필드명을 사용합니다 (데이터셋 JSON).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanDataRow {
    #[serde(rename(serialize = "Scanner"))]
    pub scanner: String,
    #[serde(rename(serialize = "Repository"))]
    pub repository: String,
    #[serde(rename(serialize = "Artifact Digest"))]
    pub artifact_digest: String,
    #[serde(rename(serialize = "CVE"))]
    pub cve_id: String,
    #[serde(rename(serialize = "Package"))]
    pub package: String,
    #[serde(rename(serialize = "Current Version"))]
    pub version: String,
    #[serde(rename(serialize = "Fixed in version"))]
    pub fixed_version: String,
    #[serde(rename(serialize = "Severity"))]
    pub severity: String,
    #[serde(rename(serialize = "CWE Ids"))]
    pub cwe_ids: String,
    #[serde(rename(serialize = "CVSS3 Score"))]
    pub cvss_score_v3: Option<f64>,
    #[serde(rename(serialize = "CVSS2 Score"))]
    pub cvss_score_v2: Option<f64>,
    #[serde(rename(serialize = "CVSS3 Vector"))]
    pub cvss_vector_v3: String,
    #[serde(rename(serialize = "CVSS2 Vector"))]
    pub cvss_vector_v2: String,
    #[serde(rename(serialize = "Additional Data"))]
    pub additional_data: String,
}

/// 파일 콘텐츠 다이제스트 (`sha256:<64자리 소문자 hex>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest {
    hex: String,
}

impl ContentDigest {
    /// 다이제스트 알고리즘 접두어
    pub const ALGORITHM: &'static str = "sha256";

    /// SHA-256 해시 바이트로부터 다이제스트를 생성합니다.
    pub fn from_sha256(bytes: impl AsRef<[u8]>) -> Self {
        Self {
            hex: hex::encode(bytes),
        }
    }

    /// hex 인코딩 부분만 반환합니다.
    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", Self::ALGORITHM, self.hex)
    }
}

impl FromStr for ContentDigest {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix(Self::ALGORITHM)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| ExportError::InvalidDigest(s.to_owned()))?;

        let well_formed = hex.len() == 64
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(ExportError::InvalidDigest(s.to_owned()));
        }

        Ok(Self {
            hex: hex.to_owned(),
        })
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = ExportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.to_string()
    }
}

/// 시스템 아티팩트 등록 요청 레코드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemArtifactRecord {
    /// 리포지토리 이름 (파일 이름에서 확장자를 뺀 값)
    pub repository: String,
    /// 콘텐츠 다이제스트
    pub digest: ContentDigest,
    /// 파일 크기 (바이트)
    pub size: u64,
    /// 아티팩트 유형 태그
    pub artifact_type: String,
    /// 벤더 태그 (소문자)
    pub vendor: String,
}

/// 실행 레코드의 extra attrs
pub type ExtraAttrs = serde_json::Map<String, serde_json::Value>;

/// 작업 실행 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// 실행 ID
    pub id: ExecutionId,
    /// 실행에 부가된 key/value 속성
    #[serde(default)]
    pub extra_attrs: ExtraAttrs,
}

impl ExecutionRecord {
    /// 빈 속성을 가진 레코드를 생성합니다.
    pub fn new(id: ExecutionId) -> Self {
        Self {
            id,
            extra_attrs: ExtraAttrs::new(),
        }
    }
}

/// 데이터 조회 범위
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    /// 필터 조건 없음: 아티팩트 제약 없이 전체 조회
    All,
    /// 필터로 해석된 아티팩트 ID 목록 (비어 있지 않음)
    Artifacts(Vec<ArtifactId>),
}

/// 내보내기 작업 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// 필터 조건에 맞는 아티팩트가 없어 아무것도 내보내지 않음
    NoMatch,
    /// 파일을 내보내고 시스템 아티팩트로 등록함
    Exported(ExportSummary),
}

/// 성공한 내보내기 요약
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// 실행 ID
    pub execution_id: ExecutionId,
    /// 등록된 시스템 아티팩트 ID
    pub artifact_id: SystemArtifactId,
    /// 리포지토리 이름
    pub repository: String,
    /// 콘텐츠 다이제스트
    pub digest: ContentDigest,
    /// 파일 크기 (바이트)
    pub size: u64,
    /// 기록한 행 수 (헤더 제외)
    pub rows: u64,
    /// 조회한 페이지 수
    pub pages: u64,
    /// 조회 배치 수
    pub batches: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn id_types_display_inner_value() {
        assert_eq!(ArtifactId(7).to_string(), "7");
        assert_eq!(ProjectId::from(3), ProjectId(3));
    }

    #[test]
    fn filter_request_accepts_camel_case_and_ignores_unknown_keys() {
        let json = r#"{
            "userName": "alice",
            "projects": ["library"],
            "cveIds": ["CVE-2021-44228"],
            "jobName": "weekly"
        }"#;
        let request: FilterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.user_name, "alice");
        assert!(request.projects.contains("library"));
        assert!(request.cve_ids.contains("CVE-2021-44228"));
        assert!(request.tags.is_empty());
    }

    #[test]
    fn filter_request_rejects_wrong_types() {
        let result: Result<FilterRequest, _> = serde_json::from_str(r#"{"projects": "library"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn scan_data_row_deserializes_snake_case_with_defaults() {
        let json = r#"{"cve_id": "CVE-1", "package": "openssl", "cvss_score_v3": 9.8}"#;
        let row: ScanDataRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.cve_id, "CVE-1");
        assert_eq!(row.cvss_score_v3, Some(9.8));
        assert_eq!(row.cvss_score_v2, None);
        assert!(row.scanner.is_empty());
    }

    #[test]
    fn content_digest_display_has_algorithm_prefix() {
        let digest: ContentDigest = format!("sha256:{EMPTY_SHA256}").parse().unwrap();
        assert_eq!(digest.to_string(), format!("sha256:{EMPTY_SHA256}"));
        assert_eq!(digest.hex(), EMPTY_SHA256);
    }

    #[test]
    fn content_digest_rejects_malformed_values() {
        for bad in [
            "",
            EMPTY_SHA256,
            "md5:abcdef",
            "sha256:XYZ",
            "sha256:E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855",
        ] {
            assert!(bad.parse::<ContentDigest>().is_err(), "{bad}");
        }
    }

    #[test]
    fn content_digest_serializes_as_string() {
        let digest = ContentDigest::from_sha256([0u8; 32]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"sha256:{}\"", "0".repeat(64)));
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn export_outcome_serializes_with_tag() {
        let json = serde_json::to_value(ExportOutcome::NoMatch).unwrap();
        assert_eq!(json["outcome"], "no_match");
    }
}
