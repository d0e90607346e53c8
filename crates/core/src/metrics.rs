//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `scandata_`
//! - 모듈명: `export_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! 이 워크스페이스는 익스포터를 설치하지 않습니다. 레코더는 호스트 프로세스가 선택합니다.

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, no_match, failure)
pub const LABEL_RESULT: &str = "result";

/// 실패 단계 레이블 키 (filter, retrieve, serialize, fingerprint, persist, annotate)
pub const LABEL_STAGE: &str = "stage";

// ─── Scan Data Export 메트릭 ────────────────────────────────────────

/// Export: 종료된 내보내기 작업 수 (counter, label: result)
pub const EXPORT_JOBS_TOTAL: &str = "scandata_export_jobs_total";

/// Export: 단계별 실패 수 (counter, label: stage)
pub const EXPORT_FAILURES_TOTAL: &str = "scandata_export_failures_total";

/// Export: 조회한 페이지 수 (counter)
pub const EXPORT_PAGES_FETCHED_TOTAL: &str = "scandata_export_pages_fetched_total";

/// Export: CSV에 기록한 행 수 (counter)
pub const EXPORT_ROWS_WRITTEN_TOTAL: &str = "scandata_export_rows_written_total";

/// Export: 저장된 CSV 바이트 수 (counter)
pub const EXPORT_BYTES_TOTAL: &str = "scandata_export_bytes_total";

/// Export: 마지막 실행에서 필터로 해석된 아티팩트 수 (gauge)
pub const EXPORT_ARTIFACTS_RESOLVED: &str = "scandata_export_artifacts_resolved";

/// Export: 임시 파일 삭제 실패 수 (counter)
pub const EXPORT_CLEANUP_FAILURES_TOTAL: &str = "scandata_export_cleanup_failures_total";

/// Export: 전체 내보내기 소요 시간 (histogram, 초)
pub const EXPORT_DURATION_SECONDS: &str = "scandata_export_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        EXPORT_JOBS_TOTAL,
        "Total number of finished scan data export jobs by result"
    );
    describe_counter!(
        EXPORT_FAILURES_TOTAL,
        "Total number of failed scan data exports by pipeline stage"
    );
    describe_counter!(
        EXPORT_PAGES_FETCHED_TOTAL,
        "Total number of scan data pages fetched from the data source"
    );
    describe_counter!(
        EXPORT_ROWS_WRITTEN_TOTAL,
        "Total number of scan data rows written to export files"
    );
    describe_counter!(
        EXPORT_BYTES_TOTAL,
        "Total bytes of export files registered as system artifacts"
    );
    describe_gauge!(
        EXPORT_ARTIFACTS_RESOLVED,
        "Number of artifacts resolved by the filters of the last export"
    );
    describe_counter!(
        EXPORT_CLEANUP_FAILURES_TOTAL,
        "Total number of scratch export files that could not be removed"
    );
    describe_histogram!(
        EXPORT_DURATION_SECONDS,
        "End-to-end duration of a scan data export job in seconds"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_share_prefix() {
        let names = [
            EXPORT_JOBS_TOTAL,
            EXPORT_FAILURES_TOTAL,
            EXPORT_PAGES_FETCHED_TOTAL,
            EXPORT_ROWS_WRITTEN_TOTAL,
            EXPORT_BYTES_TOTAL,
            EXPORT_ARTIFACTS_RESOLVED,
            EXPORT_CLEANUP_FAILURES_TOTAL,
            EXPORT_DURATION_SECONDS,
        ];
        for name in names {
            assert!(name.starts_with("scandata_export_"), "{name}");
        }
    }

    #[test]
    fn describe_all_without_recorder_is_noop() {
        describe_all();
    }
}
