//! 임시 내보내기 파일 정리
//!
//! [`ScratchFile`]은 작업 하나가 사용하는 임시 CSV 파일 경로를 소유합니다.
//! 작업은 어떤 경로로 끝나든 마지막에 [`ScratchFile::release`]를 호출하며,
//! 호출 전에 future가 버려지면 `Drop`에서 동기적으로 삭제를 시도합니다.
//! 삭제 실패는 로그와 메트릭으로만 남고 작업 결과를 바꾸지 않습니다.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use scandata_core::metrics as m;
use scandata_core::types::ExecutionId;

/// 내보내기 파일 이름 접두어
pub const FILE_PREFIX: &str = "scandata_export_";
/// 내보내기 파일 확장자
pub const FILE_EXTENSION: &str = "csv";

/// 정리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// 파일을 삭제함
    Removed,
    /// 삭제할 파일이 없음
    Absent,
    /// 삭제 실패 (로그만 남김)
    Failed,
}

/// 작업 하나의 임시 내보내기 파일
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    released: bool,
}

impl ScratchFile {
    /// 실행 ID로부터 결정되는 파일 경로를 소유합니다.
    ///
    /// 같은 실행 ID는 항상 같은 경로를 가지므로, 재시도는 이전 시도가 남긴 파일을 덮어씁니다.
    pub fn for_job(export_dir: &Path, job_id: ExecutionId) -> Self {
        Self {
            path: export_dir.join(file_name(job_id)),
            released: false,
        }
    }

    /// 임시 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 임시 파일을 삭제합니다. 파일이 없으면 아무것도 하지 않습니다.
    pub async fn release(mut self) -> CleanupOutcome {
        self.released = true;
        let outcome = match tokio::fs::remove_file(&self.path).await {
            Ok(()) => CleanupOutcome::Removed,
            Err(e) => classify(&self.path, &e),
        };
        if outcome == CleanupOutcome::Removed {
            debug!(path = %self.path.display(), "scratch export file removed");
        }
        outcome
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(
                path = %self.path.display(),
                "scratch export file removed on drop"
            ),
            Err(e) => {
                classify(&self.path, &e);
            }
        }
    }
}

/// 실행 ID에 해당하는 내보내기 파일 이름
pub fn file_name(job_id: ExecutionId) -> String {
    format!("{FILE_PREFIX}{job_id}.{FILE_EXTENSION}")
}

fn classify(path: &Path, e: &std::io::Error) -> CleanupOutcome {
    if e.kind() == ErrorKind::NotFound {
        info!(path = %path.display(), "no scratch export file to remove");
        CleanupOutcome::Absent
    } else {
        metrics::counter!(m::EXPORT_CLEANUP_FAILURES_TOTAL).increment(1);
        error!(
            path = %path.display(),
            error = %e,
            "failed to remove scratch export file"
        );
        CleanupOutcome::Failed
    }
}
