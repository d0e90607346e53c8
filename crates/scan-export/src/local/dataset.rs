//! JSON 스캔 데이터셋
//!
//! # 파일 형식
//!
//! ```json
//! {
//!   "projects":     [{ "id": 1, "name": "library", "admins": ["admin"] }],
//!   "repositories": [{ "id": 10, "project_id": 1, "name": "library/nginx" }],
//!   "artifacts":    [{ "id": 100, "repository_id": 10, "digest": "sha256:..",
//!                      "tags": ["latest"], "labels": ["prod"] }],
//!   "rows":         [{ "id": 1, "artifact_id": 100, "cve_id": "CVE-2021-44228",
//!                      "package": "log4j", "severity": "Critical" }]
//! }
//! ```
//!
//! 행의 `repository`, `artifact_digest`가 비어 있으면 아티팩트 정보로 채워서 반환합니다.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use scandata_core::error::StorageError;

use crate::filter::{FilterProcessor, ProjectScope};
use crate::source::{ExportQuery, ScanDataSource};
use crate::types::{ArtifactId, ProjectId, RepositoryId, ScanDataRow};

/// 프로젝트
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectEntry {
    pub id: ProjectId,
    pub name: String,
    /// 프로젝트 관리자 사용자 이름
    #[serde(default)]
    pub admins: Vec<String>,
}

/// 리포지토리
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepositoryEntry {
    pub id: RepositoryId,
    pub project_id: ProjectId,
    pub name: String,
}

/// 아티팩트
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtifactEntry {
    pub id: ArtifactId,
    pub repository_id: RepositoryId,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// 아티팩트에 연결된 스캔 데이터 행
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetRow {
    /// 정렬 키
    pub id: i64,
    pub artifact_id: ArtifactId,
    #[serde(flatten)]
    pub data: ScanDataRow,
}

/// 메모리에 적재된 스캔 데이터셋
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanDataset {
    pub projects: Vec<ProjectEntry>,
    pub repositories: Vec<RepositoryEntry>,
    pub artifacts: Vec<ArtifactEntry>,
    pub rows: Vec<DatasetRow>,
}

impl ScanDataset {
    /// JSON 파일에서 데이터셋을 로드합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(format!("dataset {}", path.display()))
            } else {
                StorageError::Io(e)
            }
        })?;
        let dataset = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            projects = dataset.projects.len(),
            artifacts = dataset.artifacts.len(),
            rows = dataset.rows.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// JSON 문자열에서 데이터셋을 파싱합니다. 행은 `id` 순으로 정렬됩니다.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let mut dataset: Self = serde_json::from_str(json)
            .map_err(|e| StorageError::Query(format!("invalid dataset: {e}")))?;
        dataset.rows.sort_by_key(|row| row.id);
        Ok(dataset)
    }

    /// 행 데이터에 빠진 리포지토리 이름과 아티팩트 다이제스트를 채웁니다.
    fn hydrate(&self, row: &DatasetRow, artifacts: &HashMap<ArtifactId, &ArtifactEntry>) -> ScanDataRow {
        let mut data = row.data.clone();
        if let Some(artifact) = artifacts.get(&row.artifact_id) {
            if data.artifact_digest.is_empty() {
                data.artifact_digest = artifact.digest.clone();
            }
            if data.repository.is_empty() {
                if let Some(repo) = self
                    .repositories
                    .iter()
                    .find(|r| r.id == artifact.repository_id)
                {
                    data.repository = repo.name.clone();
                }
            }
        }
        data
    }
}

fn matches_any(candidates: &[String], wanted: &BTreeSet<String>) -> bool {
    wanted.is_empty() || candidates.iter().any(|c| wanted.contains(c))
}

impl FilterProcessor for ScanDataset {
    async fn resolve_projects(
        &self,
        principal: &str,
        scope: &ProjectScope,
    ) -> Result<Vec<ProjectId>, StorageError> {
        Ok(self
            .projects
            .iter()
            .filter(|p| match scope {
                ProjectScope::Named(names) => names.contains(&p.name),
                ProjectScope::AdministeredBy => p.admins.iter().any(|a| a == principal),
            })
            .map(|p| p.id)
            .collect())
    }

    async fn resolve_repositories(
        &self,
        names: &BTreeSet<String>,
        projects: &[ProjectId],
    ) -> Result<Vec<RepositoryId>, StorageError> {
        let projects: HashSet<ProjectId> = projects.iter().copied().collect();
        Ok(self
            .repositories
            .iter()
            .filter(|r| projects.contains(&r.project_id))
            .filter(|r| names.is_empty() || names.contains(&r.name))
            .map(|r| r.id)
            .collect())
    }

    async fn resolve_by_tags(
        &self,
        tags: &BTreeSet<String>,
        repositories: &[RepositoryId],
    ) -> Result<Vec<ArtifactId>, StorageError> {
        let repositories: HashSet<RepositoryId> = repositories.iter().copied().collect();
        Ok(self
            .artifacts
            .iter()
            .filter(|a| repositories.contains(&a.repository_id))
            .filter(|a| matches_any(&a.tags, tags))
            .map(|a| a.id)
            .collect())
    }

    async fn resolve_by_labels(
        &self,
        labels: &BTreeSet<String>,
        artifacts: &[ArtifactId],
    ) -> Result<Vec<ArtifactId>, StorageError> {
        let by_id: HashMap<ArtifactId, &ArtifactEntry> =
            self.artifacts.iter().map(|a| (a.id, a)).collect();
        Ok(artifacts
            .iter()
            .copied()
            .filter(|id| {
                by_id
                    .get(id)
                    .is_some_and(|a| matches_any(&a.labels, labels))
            })
            .collect())
    }
}

impl ScanDataSource for ScanDataset {
    async fn fetch_page(&self, query: &ExportQuery) -> Result<Vec<ScanDataRow>, StorageError> {
        if query.page_number == 0 || query.page_size == 0 {
            return Err(StorageError::Query(format!(
                "invalid page {} of size {}",
                query.page_number, query.page_size
            )));
        }

        let allowed: Option<HashSet<ArtifactId>> = query
            .artifact_ids
            .as_ref()
            .map(|ids| ids.iter().copied().collect());
        let artifacts: HashMap<ArtifactId, &ArtifactEntry> =
            self.artifacts.iter().map(|a| (a.id, a)).collect();
        let skip = (query.page_number as usize - 1).saturating_mul(query.page_size);

        Ok(self
            .rows
            .iter()
            .filter(|row| allowed.as_ref().is_none_or(|ids| ids.contains(&row.artifact_id)))
            .filter(|row| query.cve_ids.is_empty() || query.cve_ids.contains(&row.data.cve_id))
            .skip(skip)
            .take(query.page_size)
            .map(|row| self.hydrate(row, &artifacts))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "projects": [
            {"id": 1, "name": "library", "admins": ["admin"]},
            {"id": 2, "name": "private", "admins": ["alice"]}
        ],
        "repositories": [
            {"id": 10, "project_id": 1, "name": "library/nginx"},
            {"id": 11, "project_id": 1, "name": "library/redis"},
            {"id": 20, "project_id": 2, "name": "private/app"}
        ],
        "artifacts": [
            {"id": 100, "repository_id": 10, "digest": "sha256:n1", "tags": ["latest"], "labels": ["prod"]},
            {"id": 101, "repository_id": 11, "digest": "sha256:r1", "tags": ["7.0"]},
            {"id": 200, "repository_id": 20, "digest": "sha256:a1", "tags": ["latest"], "labels": ["prod"]}
        ],
        "rows": [
            {"id": 3, "artifact_id": 101, "cve_id": "CVE-3"},
            {"id": 1, "artifact_id": 100, "cve_id": "CVE-1", "scanner": "Trivy"},
            {"id": 2, "artifact_id": 100, "cve_id": "CVE-2", "repository": "override"},
            {"id": 4, "artifact_id": 200, "cve_id": "CVE-1"}
        ]
    }"#;

    fn dataset() -> ScanDataset {
        ScanDataset::from_json(DATASET).unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    fn query(artifacts: Option<Vec<i64>>, page: u32, size: usize) -> ExportQuery {
        ExportQuery {
            artifact_ids: artifacts.map(|ids| ids.into_iter().map(ArtifactId).collect()),
            cve_ids: BTreeSet::new(),
            page_number: page,
            page_size: size,
            row_offset: 0,
        }
    }

    #[test]
    fn rows_are_sorted_by_id() {
        let ids: Vec<i64> = dataset().rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn row_fields_use_snake_case_keys() {
        let parsed = ScanDataset::from_json(
            r#"{"rows": [{"id": 7, "artifact_id": 100, "cve_id": "CVE-7",
                "fixed_version": "2.0", "cvss_score_v3": 9.8, "cwe_ids": "CWE-79"}]}"#,
        )
        .unwrap();
        assert!(parsed.projects.is_empty());
        assert!(parsed.artifacts.is_empty());
        let row = &parsed.rows[0];
        assert_eq!(row.artifact_id, ArtifactId(100));
        assert_eq!(row.data.cve_id, "CVE-7");
        assert_eq!(row.data.fixed_version, "2.0");
        assert_eq!(row.data.cvss_score_v3, Some(9.8));
        assert_eq!(row.data.cwe_ids, "CWE-79");
        assert!(row.data.repository.is_empty());
    }

    #[test]
    fn invalid_json_is_query_error() {
        assert!(matches!(
            ScanDataset::from_json("{\"rows\": 5}"),
            Err(StorageError::Query(_))
        ));
    }

    #[tokio::test]
    async fn administered_projects_for_principal() {
        let ds = dataset();
        let ids = ds
            .resolve_projects("alice", &ProjectScope::AdministeredBy)
            .await
            .unwrap();
        assert_eq!(ids, vec![ProjectId(2)]);
        let none = ds
            .resolve_projects("mallory", &ProjectScope::AdministeredBy)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn named_projects_match_exactly() {
        let ds = dataset();
        let ids = ds
            .resolve_projects("anyone", &ProjectScope::Named(set(&["library", "missing"])))
            .await
            .unwrap();
        assert_eq!(ids, vec![ProjectId(1)]);
    }

    #[tokio::test]
    async fn repositories_limited_to_projects_and_names() {
        let ds = dataset();
        let all = ds
            .resolve_repositories(&BTreeSet::new(), &[ProjectId(1)])
            .await
            .unwrap();
        assert_eq!(all, vec![RepositoryId(10), RepositoryId(11)]);

        let named = ds
            .resolve_repositories(&set(&["library/redis", "private/app"]), &[ProjectId(1)])
            .await
            .unwrap();
        assert_eq!(named, vec![RepositoryId(11)]);
    }

    #[tokio::test]
    async fn tags_and_labels_narrow_artifacts() {
        let ds = dataset();
        let tagged = ds
            .resolve_by_tags(&set(&["latest"]), &[RepositoryId(10), RepositoryId(11)])
            .await
            .unwrap();
        assert_eq!(tagged, vec![ArtifactId(100)]);

        let labelled = ds
            .resolve_by_labels(&set(&["prod"]), &[ArtifactId(101), ArtifactId(100)])
            .await
            .unwrap();
        assert_eq!(labelled, vec![ArtifactId(100)]);

        let unconstrained = ds
            .resolve_by_labels(&BTreeSet::new(), &[ArtifactId(101), ArtifactId(100)])
            .await
            .unwrap();
        assert_eq!(unconstrained, vec![ArtifactId(101), ArtifactId(100)]);
    }

    #[tokio::test]
    async fn fetch_page_slices_in_row_order() {
        let ds = dataset();
        let first = ds.fetch_page(&query(None, 1, 3)).await.unwrap();
        let second = ds.fetch_page(&query(None, 2, 3)).await.unwrap();
        let third = ds.fetch_page(&query(None, 3, 3)).await.unwrap();

        let cves: Vec<&str> = first.iter().map(|r| r.cve_id.as_str()).collect();
        assert_eq!(cves, vec!["CVE-1", "CVE-2", "CVE-3"]);
        assert_eq!(second.len(), 1);
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn fetch_page_filters_artifacts_and_cves() {
        let ds = dataset();
        let mut q = query(Some(vec![100, 200]), 1, 10);
        q.cve_ids = set(&["CVE-1"]);
        let rows = ds.fetch_page(&q).await.unwrap();
        let repos: Vec<&str> = rows.iter().map(|r| r.repository.as_str()).collect();
        assert_eq!(repos, vec!["library/nginx", "private/app"]);
    }

    #[tokio::test]
    async fn fetch_page_hydrates_missing_fields_only() {
        let ds = dataset();
        let rows = ds.fetch_page(&query(Some(vec![100]), 1, 10)).await.unwrap();
        assert_eq!(rows[0].repository, "library/nginx");
        assert_eq!(rows[0].artifact_digest, "sha256:n1");
        assert_eq!(rows[0].scanner, "Trivy");
        assert_eq!(rows[1].repository, "override");
    }

    #[tokio::test]
    async fn fetch_page_rejects_page_zero() {
        let ds = dataset();
        assert!(ds.fetch_page(&query(None, 0, 10)).await.is_err());
    }
}
