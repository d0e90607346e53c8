//! 콘텐츠 다이제스트 계산
//!
//! 닫힌 내보내기 파일을 처음부터 끝까지 스트리밍으로 읽어 SHA-256 다이제스트를 계산합니다.
//! 해시 계산은 blocking 스레드 풀에서 수행합니다.

use std::future::Future;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ExportError;
use crate::types::ContentDigest;

/// 한 번에 읽는 버퍼 크기
const READ_BUF_SIZE: usize = 64 * 1024;

/// 파일 콘텐츠 다이제스트 계산기
pub trait DigestCalculator: Send + Sync {
    /// 파일 전체 내용의 다이제스트를 계산합니다.
    fn calculate(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<ContentDigest, ExportError>> + Send;
}

/// SHA-256 다이제스트 계산기
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256DigestCalculator;

impl DigestCalculator for Sha256DigestCalculator {
    async fn calculate(&self, path: &Path) -> Result<ContentDigest, ExportError> {
        let owned: PathBuf = path.to_path_buf();
        let digest = tokio::task::spawn_blocking(move || sha256_file(&owned))
            .await
            .map_err(|e| ExportError::Fingerprint {
                path: path.display().to_string(),
                source: std::io::Error::other(format!("spawn_blocking failed: {e}")),
            })??;

        debug!(path = %path.display(), digest = %digest, "digest calculated");
        Ok(digest)
    }
}

/// 파일을 스트리밍으로 읽어 SHA-256 다이제스트를 계산합니다 (동기 I/O).
///
/// `tokio::task::spawn_blocking` 내에서 호출되어야 합니다.
pub fn sha256_file(path: &Path) -> Result<ContentDigest, ExportError> {
    let fingerprint_error = |source| ExportError::Fingerprint {
        path: path.display().to_string(),
        source,
    };

    let mut file = std::fs::File::open(path).map_err(fingerprint_error)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(fingerprint_error)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ContentDigest::from_sha256(hasher.finalize()))
}
