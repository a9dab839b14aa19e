//! A platform backed by a local directory tree.
//!
//! Artifacts live at `<root>/<project>/<name>.tdsx` (or `.tds`); artifacts
//! directly under the root have no project. A datasource id is the artifact
//! path relative to the root, e.g. `Finance/Orders.tdsx`.
//!
//! Refresh requests are appended to `<root>/.refresh-queue` as JSON lines.
//! Requesting a refresh for an id that is already queued fails with the
//! platform's duplicate message until the queue is drained.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tds_core::ConnectionCredentials;
use tokio::sync::Mutex;

use crate::error::{DUPLICATE_REFRESH_MESSAGE, ProviderError};
use crate::provider::{DatasourceProvider, DatasourceRef};

pub const REFRESH_QUEUE_FILE: &str = ".refresh-queue";

const ARTIFACT_EXTENSIONS: [&str; 2] = ["tdsx", "tds"];

/// One queued extract refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub id: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct DirectoryProvider {
    root: PathBuf,
    queue: Mutex<()>,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            queue: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn queue_path(&self) -> PathBuf {
        self.root.join(REFRESH_QUEUE_FILE)
    }

    /// Path of an existing artifact. Ids that would escape the root are
    /// treated as unknown.
    fn artifact_path(&self, id: &str) -> Result<PathBuf, ProviderError> {
        let relative = Path::new(id);
        let inside_root = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        let path = self.root.join(relative);
        if inside_root && path.is_file() {
            Ok(path)
        } else {
            Err(ProviderError::NotFound(id.to_string()))
        }
    }

    fn read_queue(&self) -> Result<Vec<RefreshRequest>, ProviderError> {
        let path = self.queue_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines(&path)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| {
                ProviderError::Other(format!("corrupt refresh queue entry: {error}"))
            })
    }

    /// Refresh requests not yet drained, oldest first.
    pub async fn pending_refreshes(&self) -> Result<Vec<RefreshRequest>, ProviderError> {
        let _guard = self.queue.lock().await;
        self.read_queue()
    }

    /// Take every queued refresh request and empty the queue.
    pub async fn drain_refresh_queue(&self) -> Result<Vec<RefreshRequest>, ProviderError> {
        let _guard = self.queue.lock().await;
        let pending = self.read_queue()?;
        if !pending.is_empty() {
            tokio::fs::remove_file(self.queue_path()).await?;
        }
        tracing::debug!(drained = pending.len(), "drained refresh queue");
        Ok(pending)
    }

    async fn artifacts_in(
        &self,
        dir: &Path,
        project: &str,
        found: &mut Vec<DatasourceRef>,
    ) -> Result<(), ProviderError> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let is_artifact = path
                .extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| ARTIFACT_EXTENSIONS.contains(&extension));
            let (Some(name), Some(file_name)) = (
                path.file_stem().and_then(|stem| stem.to_str()),
                path.file_name().and_then(|file| file.to_str()),
            ) else {
                continue;
            };
            if !is_artifact {
                continue;
            }
            let id = if project.is_empty() {
                file_name.to_string()
            } else {
                format!("{project}/{file_name}")
            };
            found.push(DatasourceRef {
                id,
                name: name.to_string(),
                project: project.to_string(),
            });
        }
        Ok(())
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

impl DatasourceProvider for DirectoryProvider {
    async fn resolve_datasources(&self) -> Result<Vec<DatasourceRef>, ProviderError> {
        let mut found = Vec::new();
        self.artifacts_in(&self.root, "", &mut found).await?;

        let mut projects = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = projects.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_dir() || is_hidden(&path) {
                continue;
            }
            let Some(project) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let project = project.to_string();
            self.artifacts_in(&path, &project, &mut found).await?;
        }

        found.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::debug!(
            root = %self.root.display(),
            datasources = found.len(),
            "listed datasources"
        );
        Ok(found)
    }

    async fn download(
        &self,
        id: &str,
        include_extract: bool,
        dir: &Path,
    ) -> Result<PathBuf, ProviderError> {
        let source = self.artifact_path(id)?;
        let file_name = source
            .file_name()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        let target = dir.join(file_name);
        tokio::fs::copy(&source, &target).await?;
        // Artifacts on disk are always complete; the extract flag does not
        // change what is copied.
        tracing::debug!(
            datasource_id = id,
            include_extract,
            path = %target.display(),
            "downloaded"
        );
        Ok(target)
    }

    async fn publish(
        &self,
        path: &Path,
        id: &str,
        credentials: Option<&ConnectionCredentials>,
    ) -> Result<(), ProviderError> {
        let target = self.artifact_path(id)?;
        let staging = target.with_extension("publishing");
        tokio::fs::copy(path, &staging).await?;
        tokio::fs::rename(&staging, &target).await?;
        tracing::info!(
            datasource_id = id,
            username = credentials.map(|credentials| credentials.username.as_str()),
            "published"
        );
        Ok(())
    }

    async fn refresh_extract(&self, id: &str) -> Result<(), ProviderError> {
        self.artifact_path(id)?;
        let _guard = self.queue.lock().await;
        if self.read_queue()?.iter().any(|request| request.id == id) {
            return Err(ProviderError::from_message(format!(
                "{id}: {DUPLICATE_REFRESH_MESSAGE}"
            )));
        }

        let request = RefreshRequest {
            id: id.to_string(),
            requested_at: Utc::now(),
        };
        serde_jsonlines::append_json_lines(self.queue_path(), [&request])?;
        tracing::debug!(datasource_id = id, "refresh queued");
        Ok(())
    }
}
