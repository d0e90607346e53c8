//! 필터 해석
//!
//! [`FilterResolver`]는 사용자 필터 조건을 아티팩트 ID 목록으로 좁혀 나갑니다.
//!
//! ```text
//! projects ──> repositories ──> tags ──> labels ──> Vec<ArtifactId>
//!     │             │             │         │
//!     └── empty ────┴── empty ────┴─ empty ─┴──> NoMatch (이후 단계 호출 안 함)
//! ```
//!
//! 각 단계는 [`FilterProcessor`]에 위임하며, 한 단계의 결과가 비면 즉시 멈춥니다.

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, info};

use scandata_core::error::StorageError;

use crate::error::{ExportError, FilterStage};
use crate::types::{ArtifactId, FilterRequest, ProjectId, RepositoryId};

/// 프로젝트 해석 범위
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectScope {
    /// 이름으로 지정한 프로젝트
    Named(BTreeSet<String>),
    /// 요청 사용자가 관리자로 등록된 모든 프로젝트
    AdministeredBy,
}

impl ProjectScope {
    /// 요청한 프로젝트 이름 집합으로부터 범위를 결정합니다.
    pub fn from_names(names: &BTreeSet<String>) -> Self {
        if names.is_empty() {
            Self::AdministeredBy
        } else {
            Self::Named(names.clone())
        }
    }
}

/// 필터 조건을 ID 집합으로 해석하는 협력자 trait
///
/// 빈 이름/태그/라벨 집합은 "제약 없음"을 뜻합니다.
/// 구현체는 입력 범위 밖의 ID를 반환해서는 안 됩니다.
pub trait FilterProcessor: Send + Sync {
    /// 요청 사용자와 프로젝트 범위로 프로젝트 ID를 해석합니다.
    fn resolve_projects(
        &self,
        principal: &str,
        scope: &ProjectScope,
    ) -> impl Future<Output = Result<Vec<ProjectId>, StorageError>> + Send;

    /// 프로젝트 안에서 이름이 일치하는 리포지토리 ID를 해석합니다.
    fn resolve_repositories(
        &self,
        names: &BTreeSet<String>,
        projects: &[ProjectId],
    ) -> impl Future<Output = Result<Vec<RepositoryId>, StorageError>> + Send;

    /// 리포지토리 안에서 태그가 일치하는 아티팩트 ID를 해석합니다.
    fn resolve_by_tags(
        &self,
        tags: &BTreeSet<String>,
        repositories: &[RepositoryId],
    ) -> impl Future<Output = Result<Vec<ArtifactId>, StorageError>> + Send;

    /// 라벨이 일치하는 아티팩트만 남깁니다.
    fn resolve_by_labels(
        &self,
        labels: &BTreeSet<String>,
        artifacts: &[ArtifactId],
    ) -> impl Future<Output = Result<Vec<ArtifactId>, StorageError>> + Send;
}

impl<T: FilterProcessor> FilterProcessor for Arc<T> {
    fn resolve_projects(
        &self,
        principal: &str,
        scope: &ProjectScope,
    ) -> impl Future<Output = Result<Vec<ProjectId>, StorageError>> + Send {
        (**self).resolve_projects(principal, scope)
    }

    fn resolve_repositories(
        &self,
        names: &BTreeSet<String>,
        projects: &[ProjectId],
    ) -> impl Future<Output = Result<Vec<RepositoryId>, StorageError>> + Send {
        (**self).resolve_repositories(names, projects)
    }

    fn resolve_by_tags(
        &self,
        tags: &BTreeSet<String>,
        repositories: &[RepositoryId],
    ) -> impl Future<Output = Result<Vec<ArtifactId>, StorageError>> + Send {
        (**self).resolve_by_tags(tags, repositories)
    }

    fn resolve_by_labels(
        &self,
        labels: &BTreeSet<String>,
        artifacts: &[ArtifactId],
    ) -> impl Future<Output = Result<Vec<ArtifactId>, StorageError>> + Send {
        (**self).resolve_by_labels(labels, artifacts)
    }
}

/// 필터 해석기
///
/// 해석 결과가 빈 목록이면 호출자는 NoMatch로 처리합니다.
pub struct FilterResolver<'a, F> {
    processor: &'a F,
}

impl<'a, F: FilterProcessor> FilterResolver<'a, F> {
    /// 새 해석기를 생성합니다.
    pub fn new(processor: &'a F) -> Self {
        Self { processor }
    }

    /// 필터 조건을 아티팩트 ID 목록으로 해석합니다.
    ///
    /// 반환 목록은 중복이 없고 협력자가 돌려준 순서를 유지합니다.
    /// 어느 단계에서든 결과가 비면 이후 단계를 호출하지 않고 빈 목록을 반환합니다.
    pub async fn resolve(&self, request: &FilterRequest) -> Result<Vec<ArtifactId>, ExportError> {
        let scope = ProjectScope::from_names(&request.projects);
        let projects = dedup(
            self.processor
                .resolve_projects(&request.user_name, &scope)
                .await
                .map_err(|source| stage_error(FilterStage::Projects, source))?,
        );
        debug!(count = projects.len(), "projects resolved");
        if projects.is_empty() {
            return Ok(no_match(FilterStage::Projects));
        }

        let repositories = dedup(
            self.processor
                .resolve_repositories(&request.repositories, &projects)
                .await
                .map_err(|source| stage_error(FilterStage::Repositories, source))?,
        );
        debug!(count = repositories.len(), "repositories resolved");
        if repositories.is_empty() {
            return Ok(no_match(FilterStage::Repositories));
        }

        let tagged = dedup(
            self.processor
                .resolve_by_tags(&request.tags, &repositories)
                .await
                .map_err(|source| stage_error(FilterStage::Tags, source))?,
        );
        debug!(count = tagged.len(), "artifacts resolved by tags");
        if tagged.is_empty() {
            return Ok(no_match(FilterStage::Tags));
        }

        let labelled = dedup(
            self.processor
                .resolve_by_labels(&request.labels, &tagged)
                .await
                .map_err(|source| stage_error(FilterStage::Labels, source))?,
        );
        if labelled.is_empty() {
            return Ok(no_match(FilterStage::Labels));
        }

        info!(artifacts = labelled.len(), "filters resolved");
        Ok(labelled)
    }
}

fn stage_error(stage: FilterStage, source: StorageError) -> ExportError {
    ExportError::FilterResolution { stage, source }
}

fn no_match(stage: FilterStage) -> Vec<ArtifactId> {
    info!(stage = %stage, "no candidates left after filter stage");
    Vec::new()
}

/// 첫 등장 순서를 유지하며 중복을 제거합니다.
fn dedup<T: Copy + Eq + Hash>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items.into_iter().filter(|item| seen.insert(*item)).collect()
}
