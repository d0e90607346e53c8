//! 스캔 데이터 조회 협력자

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use scandata_core::error::StorageError;

use crate::types::{ArtifactId, ScanDataRow};

/// 한 페이지 조회 조건
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportQuery {
    /// 대상 아티팩트 ID (None이면 아티팩트 제약 없음)
    pub artifact_ids: Option<Vec<ArtifactId>>,
    /// CVE ID 필터 (비어 있으면 제약 없음)
    pub cve_ids: BTreeSet<String>,
    /// 페이지 번호 (1부터)
    pub page_number: u32,
    /// 페이지 크기
    pub page_size: usize,
    /// 이 배치에서 지금까지 받은 행 수
    pub row_offset: u64,
}

/// 스캔 데이터 행을 페이지 단위로 돌려주는 데이터 소스
///
/// 같은 조건에 대해 페이지 순서가 결정적이어야 하며,
/// 페이지 크기보다 적은 행을 돌려주면 마지막 페이지로 간주됩니다.
pub trait ScanDataSource: Send + Sync {
    /// 조건에 맞는 한 페이지를 조회합니다.
    fn fetch_page(
        &self,
        query: &ExportQuery,
    ) -> impl Future<Output = Result<Vec<ScanDataRow>, StorageError>> + Send;
}

impl<T: ScanDataSource> ScanDataSource for Arc<T> {
    fn fetch_page(
        &self,
        query: &ExportQuery,
    ) -> impl Future<Output = Result<Vec<ScanDataRow>, StorageError>> + Send {
        (**self).fetch_page(query)
    }
}
