//! 페이지 단위 CSV 기록
//!
//! [`CsvPageWriter`]는 열린 파일 핸들 하나를 유지하면서 조회한 페이지를 즉시 append합니다.
//! 파일에는 CSV 헤더가 맨 앞에 한 번만 기록되며, 빈 페이지는 아무것도 쓰지 않습니다.
//! 메모리에는 항상 한 페이지 분량의 인코딩 버퍼만 존재합니다.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use scandata_core::metrics as m;

use crate::error::ExportError;
use crate::types::ScanDataRow;

/// 조회한 페이지를 받아 처리하는 대상
pub trait PageSink: Send {
    /// 한 페이지의 행을 기록합니다. 빈 페이지는 무시해도 됩니다.
    fn write_page(
        &mut self,
        rows: &[ScanDataRow],
    ) -> impl Future<Output = Result<(), ExportError>> + Send;
}

/// 기록이 끝난 파일 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// 파일 경로
    pub path: PathBuf,
    /// 기록한 행 수 (헤더 제외)
    pub rows: u64,
    /// 기록한 바이트 수
    pub bytes: u64,
}

/// 증분 CSV 기록기
pub struct CsvPageWriter {
    file: File,
    path: PathBuf,
    header_written: bool,
    rows: u64,
    bytes: u64,
}

impl CsvPageWriter {
    /// 파일을 생성하고 기록기를 엽니다. 같은 경로의 파일이 있으면 비웁니다.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let path = path.into();
        let file = File::create(&path).await.map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "export file created");

        Ok(Self {
            file,
            path,
            header_written: false,
            rows: 0,
            bytes: 0,
        })
    }

    /// 기록 중인 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 지금까지 기록한 행 수
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// 헤더를 이미 기록했는지 여부
    pub fn header_written(&self) -> bool {
        self.header_written
    }

    /// 한 페이지를 파일 끝에 추가합니다.
    pub async fn append(&mut self, rows: &[ScanDataRow]) -> Result<(), ExportError> {
        if rows.is_empty() {
            return Ok(());
        }

        let chunk = encode_rows(rows, !self.header_written)
            .map_err(|source| serialization_error(&self.path, source))?;
        self.file
            .write_all(&chunk)
            .await
            .map_err(|e| serialization_error(&self.path, e.into()))?;
        self.file
            .flush()
            .await
            .map_err(|e| serialization_error(&self.path, e.into()))?;

        let count = rows.len() as u64;
        self.header_written = true;
        self.rows += count;
        self.bytes += chunk.len() as u64;
        metrics::counter!(m::EXPORT_ROWS_WRITTEN_TOTAL).increment(count);

        Ok(())
    }

    /// 버퍼를 비우고 디스크에 동기화한 뒤 파일 핸들을 닫습니다.
    pub async fn finish(mut self) -> Result<WrittenFile, ExportError> {
        self.file
            .flush()
            .await
            .map_err(|e| serialization_error(&self.path, e.into()))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| serialization_error(&self.path, e.into()))?;
        drop(self.file);

        debug!(
            path = %self.path.display(),
            rows = self.rows,
            bytes = self.bytes,
            "export file closed"
        );

        Ok(WrittenFile {
            path: self.path,
            rows: self.rows,
            bytes: self.bytes,
        })
    }
}

impl PageSink for CsvPageWriter {
    async fn write_page(&mut self, rows: &[ScanDataRow]) -> Result<(), ExportError> {
        self.append(rows).await
    }
}

/// 행 목록을 CSV 바이트로 인코딩합니다.
///
/// `with_header`가 참이면 첫 줄에 열 이름을 기록합니다. 줄 끝은 `\n`입니다.
pub fn encode_rows(rows: &[ScanDataRow], with_header: bool) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(with_header)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.into_inner().map_err(|e| e.into_error().into())
}

fn serialization_error(path: &Path, source: csv::Error) -> ExportError {
    ExportError::Serialization {
        path: path.display().to_string(),
        source,
    }
}
