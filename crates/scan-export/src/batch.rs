//! 배치 분할 및 페이지 조회
//!
//! 해석된 아티팩트 ID를 고정 크기 배치로 나누고, 배치마다 페이지를 차례로 조회해
//! [`PageSink`]에 넘깁니다. 한 번에 메모리에 올라가는 행은 한 페이지뿐입니다.
//!
//! ```text
//! [a1 .. aN] --partition(G)--> batch 0, batch 1, .. batch ceil(N/G)-1
//!                                  |
//!                    page 1 -> page 2 -> .. (행 수 < page_size 이면 종료)
//! ```

use std::collections::BTreeSet;

use tracing::{debug, info};

use scandata_core::metrics as m;

use crate::error::ExportError;
use crate::source::{ExportQuery, ScanDataSource};
use crate::types::{ArtifactId, ExportScope};
use crate::writer::PageSink;

/// 한 번의 조회 조건에 포함되는 아티팩트 ID 묶음
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBatch {
    /// 배치 인덱스 (0부터)
    pub index: usize,
    /// 배치에 포함된 아티팩트 ID (비어 있지 않음)
    pub artifact_ids: Vec<ArtifactId>,
}

/// 아티팩트 ID를 `group_size` 크기의 배치로 나눕니다.
///
/// 순서를 유지하며 마지막 배치만 더 작을 수 있고, 빈 배치는 만들지 않습니다.
/// `group_size`가 0이면 1로 취급합니다.
pub fn partition(ids: &[ArtifactId], group_size: usize) -> Vec<ArtifactBatch> {
    ids.chunks(group_size.max(1))
        .enumerate()
        .map(|(index, chunk)| ArtifactBatch {
            index,
            artifact_ids: chunk.to_vec(),
        })
        .collect()
}

/// 조회 진행 상태
///
/// 페이지 번호는 배치마다 1부터 시작하고, 행 오프셋은 배치 안에서 누적됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// 배치 인덱스
    pub batch: usize,
    /// 다음에 조회할 페이지 번호
    pub page_number: u32,
    /// 지금까지 받은 행 수
    pub row_offset: u64,
}

impl PageCursor {
    /// 배치의 첫 페이지 커서
    pub fn first(batch: usize) -> Self {
        Self {
            batch,
            page_number: 1,
            row_offset: 0,
        }
    }

    /// `rows`개 행을 받은 뒤 다음 페이지로 이동합니다.
    pub fn advance(&mut self, rows: usize) {
        self.page_number = self.page_number.saturating_add(1);
        self.row_offset += rows as u64;
    }
}

/// 조회 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationStats {
    /// 조회한 배치 수
    pub batches: usize,
    /// 조회한 페이지 수 (빈 페이지 포함)
    pub pages: u64,
    /// 받은 행 수
    pub rows: u64,
}

/// 배치 페이지 조회기
pub struct BatchPaginator<'a, S> {
    source: &'a S,
    group_size: usize,
    page_size: usize,
    cve_ids: BTreeSet<String>,
}

impl<'a, S: ScanDataSource> BatchPaginator<'a, S> {
    /// 새 조회기를 생성합니다.
    pub fn new(source: &'a S, group_size: usize, page_size: usize, cve_ids: BTreeSet<String>) -> Self {
        Self {
            source,
            group_size: group_size.max(1),
            page_size: page_size.max(1),
            cve_ids,
        }
    }

    /// 조회 범위의 모든 페이지를 순서대로 조회해 `sink`에 전달합니다.
    ///
    /// 배치는 순서대로 처리되며 한 번에 하나의 조회만 진행됩니다.
    /// 조회나 기록이 실패하면 즉시 중단하고 나머지 페이지는 조회하지 않습니다.
    pub async fn run<K: PageSink>(
        &self,
        scope: ExportScope,
        sink: &mut K,
    ) -> Result<PaginationStats, ExportError> {
        let batches: Vec<Option<Vec<ArtifactId>>> = match scope {
            ExportScope::All => vec![None],
            ExportScope::Artifacts(ids) => partition(&ids, self.group_size)
                .into_iter()
                .map(|batch| Some(batch.artifact_ids))
                .collect(),
        };

        info!(
            batches = batches.len(),
            page_size = self.page_size,
            "retrieving scan data"
        );

        let mut stats = PaginationStats::default();
        for (index, artifact_ids) in batches.into_iter().enumerate() {
            self.drain_batch(index, artifact_ids, sink, &mut stats).await?;
            stats.batches += 1;
        }

        Ok(stats)
    }

    async fn drain_batch<K: PageSink>(
        &self,
        batch: usize,
        artifact_ids: Option<Vec<ArtifactId>>,
        sink: &mut K,
        stats: &mut PaginationStats,
    ) -> Result<(), ExportError> {
        let mut cursor = PageCursor::first(batch);
        let mut query = ExportQuery {
            artifact_ids,
            cve_ids: self.cve_ids.clone(),
            page_number: cursor.page_number,
            page_size: self.page_size,
            row_offset: cursor.row_offset,
        };

        loop {
            query.page_number = cursor.page_number;
            query.row_offset = cursor.row_offset;

            let rows = self
                .source
                .fetch_page(&query)
                .await
                .map_err(|source| ExportError::Retrieval {
                    batch,
                    page: cursor.page_number,
                    source,
                })?;
            metrics::counter!(m::EXPORT_PAGES_FETCHED_TOTAL).increment(1);

            debug!(
                batch,
                page = cursor.page_number,
                rows = rows.len(),
                "page fetched"
            );

            sink.write_page(&rows).await?;

            stats.pages += 1;
            stats.rows += rows.len() as u64;

            let last_page = rows.len() < self.page_size;
            cursor.advance(rows.len());
            if last_page {
                break;
            }
        }

        debug!(batch, rows = cursor.row_offset, "batch drained");
        Ok(())
    }
}
