//! Run coordination: resolve, plan, apply, publish and refresh many
//! datasources with per-datasource failure isolation.
//!
//! Each datasource is worked on in its own scratch directory, created under
//! the configured work root and removed when the worker finishes, whether it
//! succeeded or not. Workers run on a `JoinSet` bounded by a semaphore.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tds_config::SyncConfig;
use tds_core::{ConfigDatasource, ConnectionCredentials, ExpectedConnection, TaskSet};
use tds_file::Document;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::applier;
use crate::error::{DatasourceFailure, ProviderError, SyncError};
use crate::planner;
use crate::provider::{ConnectionResolver, DatasourceProvider, DesiredStateSource};

/// Knobs a run is constructed with.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Datasource names never downloaded or published.
    pub excluded: Vec<String>,
    /// Datasource names never refreshed.
    pub no_refresh: Vec<String>,
    pub max_concurrency: usize,
    /// Parent of the per-datasource scratch directories.
    pub work_dir: PathBuf,
    /// Embedded into the artifact's connection on publish.
    pub credentials: Option<ConnectionCredentials>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            excluded: Vec::new(),
            no_refresh: Vec::new(),
            max_concurrency: 4,
            work_dir: std::env::temp_dir(),
            credentials: None,
        }
    }
}

impl RunOptions {
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            excluded: config.run.excluded.clone(),
            no_refresh: config.run.no_refresh.clone(),
            max_concurrency: config.run.max_concurrency.max(1),
            work_dir: config.platform.work_root(),
            credentials: config.connection.credentials(),
        }
    }

    fn is_excluded(&self, datasource_name: &str) -> bool {
        self.excluded.iter().any(|name| name == datasource_name)
    }

    fn skips_refresh(&self, datasource_name: &str) -> bool {
        self.no_refresh.iter().any(|name| name == datasource_name)
    }
}

/// What a run did, by datasource id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Planned, applied and published.
    pub published: Vec<String>,
    /// Already converged; nothing was published.
    pub unchanged: Vec<String>,
    /// Refresh queued, or already queued.
    pub refreshed: Vec<String>,
    /// Not refreshed because the datasource is listed under `no_refresh`.
    pub refresh_skipped: Vec<String>,
}

/// Drives planning and application across datasources.
pub struct RunCoordinator<P> {
    provider: Arc<P>,
    options: RunOptions,
}

impl<P: DatasourceProvider + 'static> RunCoordinator<P> {
    pub fn new(provider: P, options: RunOptions) -> Self {
        Self::with_shared(Arc::new(provider), options)
    }

    pub const fn with_shared(provider: Arc<P>, options: RunOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    fn semaphore(&self) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(self.options.max_concurrency.max(1)))
    }

    /// Attach platform ids to desired datasources.
    ///
    /// Excluded datasources are dropped. Datasources the platform does not
    /// list are logged at error level and dropped.
    pub async fn resolve(
        &self,
        desired: Vec<ConfigDatasource>,
    ) -> Result<Vec<ConfigDatasource>, SyncError> {
        let live = self.provider.resolve_datasources().await?;
        let mut resolved = Vec::with_capacity(desired.len());
        for mut datasource in desired {
            if self.options.is_excluded(&datasource.name) {
                tracing::info!(datasource = %datasource.name, "excluded, skipping");
                continue;
            }
            let Some(found) = live.iter().find(|candidate| candidate.matches(&datasource)) else {
                tracing::error!(
                    datasource = %datasource.name,
                    project = %datasource.project,
                    "datasource not found on the platform, skipping"
                );
                continue;
            };
            datasource.id = Some(found.id.clone());
            if datasource.project.is_empty() {
                datasource.project.clone_from(&found.project);
            }
            resolved.push(datasource);
        }
        Ok(resolved)
    }

    /// Download every resolved datasource without its extract and plan it.
    ///
    /// A datasource whose download, open or planning fails is logged and left
    /// out of the result.
    pub async fn plan(
        &self,
        desired: &[ConfigDatasource],
        expected: Option<&ExpectedConnection>,
    ) -> BTreeMap<String, TaskSet> {
        let semaphore = self.semaphore();
        let mut set = JoinSet::new();
        let mut workers = HashMap::new();
        for datasource in desired {
            let Some(id) = datasource.id.clone() else {
                tracing::error!(datasource = %datasource.name, "datasource has no id, skipping");
                continue;
            };
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let datasource = datasource.clone();
            let expected = expected.cloned();
            let work_dir = self.options.work_dir.clone();
            let worker = (id.clone(), datasource.name.clone());
            let handle = set.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (id, datasource.name, Err(pool_closed()));
                };
                let result =
                    plan_one(&*provider, &datasource, &id, expected.as_ref(), &work_dir).await;
                (id, datasource.name, result)
            });
            workers.insert(handle.id(), worker);
        }

        let mut planned = BTreeMap::new();
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((_, (id, _, Ok(tasks)))) => {
                    planned.insert(id, tasks);
                }
                Ok((_, (id, name, Err(error)))) => tracing::error!(
                    datasource_id = %id,
                    datasource = %name,
                    %error,
                    "planning failed, skipping"
                ),
                Err(error) => {
                    let (id, name) = workers.remove(&error.id()).unwrap_or_default();
                    tracing::error!(
                        datasource_id = %id,
                        datasource = %name,
                        %error,
                        "planning worker panicked, skipping"
                    );
                }
            }
        }
        planned
    }

    /// Apply and publish every task set that has work.
    ///
    /// Failures are isolated per datasource. When any datasource fails, a
    /// refresh is requested for every datasource in `task_sets` and the
    /// failures are returned together.
    pub async fn apply(
        &self,
        task_sets: &BTreeMap<String, TaskSet>,
    ) -> Result<RunReport, SyncError> {
        let mut report = RunReport::default();
        let semaphore = self.semaphore();
        let mut set = JoinSet::new();
        let mut workers = HashMap::new();
        for task_set in task_sets.values() {
            if self.options.is_excluded(&task_set.datasource_name) {
                tracing::info!(
                    datasource_id = %task_set.datasource_id,
                    datasource = %task_set.datasource_name,
                    "excluded, skipping"
                );
                continue;
            }
            if task_set.is_empty() {
                tracing::info!(
                    datasource_id = %task_set.datasource_id,
                    datasource = %task_set.datasource_name,
                    "no tasks, skipping"
                );
                report.unchanged.push(task_set.datasource_id.clone());
                continue;
            }
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let task_set = task_set.clone();
            let work_dir = self.options.work_dir.clone();
            let credentials = self.options.credentials.clone();
            let worker = (
                task_set.datasource_id.clone(),
                task_set.datasource_name.clone(),
            );
            let handle = set.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (task_set, Err(pool_closed()));
                };
                let result =
                    apply_one(&*provider, &task_set, &work_dir, credentials.as_ref()).await;
                (task_set, result)
            });
            workers.insert(handle.id(), worker);
        }

        let mut failures = Vec::new();
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((_, (task_set, Ok(())))) => report.published.push(task_set.datasource_id),
                Ok((_, (task_set, Err(error)))) => {
                    tracing::error!(
                        datasource_id = %task_set.datasource_id,
                        datasource = %task_set.datasource_name,
                        project = %task_set.project,
                        %error,
                        "update failed"
                    );
                    failures.push(DatasourceFailure {
                        datasource_id: task_set.datasource_id,
                        datasource: task_set.datasource_name,
                        error: error.to_string(),
                    });
                }
                Err(error) => {
                    let (datasource_id, datasource) =
                        workers.remove(&error.id()).unwrap_or_default();
                    tracing::error!(
                        datasource_id = %datasource_id,
                        datasource = %datasource,
                        %error,
                        "update worker panicked"
                    );
                    failures.push(DatasourceFailure {
                        datasource_id,
                        datasource,
                        error: error.to_string(),
                    });
                }
            }
        }
        report.published.sort();

        if failures.is_empty() {
            return Ok(report);
        }
        failures.sort_by(|a, b| a.datasource_id.cmp(&b.datasource_id));
        tracing::warn!(
            failed = failures.len(),
            "updates failed, requesting a refresh for every datasource"
        );
        if let Err(error) = self.refresh(task_sets).await {
            tracing::error!(%error, "compensating refresh failed");
        }
        Err(SyncError::Aggregate { failures })
    }

    /// Queue an extract refresh for every datasource in `task_sets`, except
    /// those listed under `no_refresh`. An already queued refresh counts as
    /// success.
    pub async fn refresh(
        &self,
        task_sets: &BTreeMap<String, TaskSet>,
    ) -> Result<RunReport, SyncError> {
        let mut report = RunReport::default();
        let mut failures = Vec::new();
        for (id, task_set) in task_sets {
            if self.options.skips_refresh(&task_set.datasource_name) {
                tracing::info!(
                    datasource_id = %id,
                    datasource = %task_set.datasource_name,
                    "marked to not refresh, skipping"
                );
                report.refresh_skipped.push(id.clone());
                continue;
            }
            match self.provider.refresh_extract(id).await {
                Ok(()) => {
                    tracing::info!(
                        datasource_id = %id,
                        datasource = %task_set.datasource_name,
                        "refresh queued"
                    );
                    report.refreshed.push(id.clone());
                }
                Err(ProviderError::DuplicateRefresh) => {
                    tracing::info!(
                        datasource_id = %id,
                        datasource = %task_set.datasource_name,
                        "refresh already queued, skipping"
                    );
                    report.refreshed.push(id.clone());
                }
                Err(error) => {
                    tracing::error!(datasource_id = %id, %error, "refresh failed");
                    failures.push(DatasourceFailure {
                        datasource_id: id.clone(),
                        datasource: task_set.datasource_name.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }
        if failures.is_empty() {
            Ok(report)
        } else {
            Err(SyncError::Aggregate { failures })
        }
    }

    /// Full cycle: load desired state, resolve, plan, apply, then refresh
    /// every planned datasource.
    pub async fn run<S, C>(&self, source: &S, connection: &C) -> Result<RunReport, SyncError>
    where
        S: DesiredStateSource,
        C: ConnectionResolver,
    {
        let desired: Vec<ConfigDatasource> = source
            .load_config()
            .map_err(|error| SyncError::Collaborator(Box::new(error)))?
            .into_iter()
            .map(ConfigDatasource::normalized)
            .collect();
        let expected = connection
            .resolve_connection()
            .map_err(|error| SyncError::Collaborator(Box::new(error)))?;

        let resolved = self.resolve(desired).await?;
        let task_sets = self.plan(&resolved, expected.as_ref()).await;
        tracing::info!(
            resolved = resolved.len(),
            planned = task_sets.len(),
            tasks = task_sets.values().map(TaskSet::len).sum::<usize>(),
            "planning complete"
        );

        let mut report = self.apply(&task_sets).await?;
        let refreshed = self.refresh(&task_sets).await?;
        report.refreshed = refreshed.refreshed;
        report.refresh_skipped = refreshed.refresh_skipped;
        Ok(report)
    }
}

fn pool_closed() -> SyncError {
    SyncError::Provider(ProviderError::Other("worker pool closed".into()))
}

async fn scratch_dir(work_dir: &Path) -> Result<TempDir, SyncError> {
    tokio::fs::create_dir_all(work_dir).await?;
    Ok(tempfile::Builder::new()
        .prefix("tdsync-")
        .tempdir_in(work_dir)?)
}

async fn plan_one<P: DatasourceProvider>(
    provider: &P,
    datasource: &ConfigDatasource,
    id: &str,
    expected: Option<&ExpectedConnection>,
    work_dir: &Path,
) -> Result<TaskSet, SyncError> {
    let scratch = scratch_dir(work_dir).await?;
    tracing::debug!(
        datasource_id = id,
        datasource = %datasource.name,
        "downloading for planning"
    );
    let path = provider.download(id, false, scratch.path()).await?;
    let document = Document::open_path(&path)?;
    planner::plan(datasource, id, &document, expected)
}

async fn apply_one<P: DatasourceProvider>(
    provider: &P,
    task_set: &TaskSet,
    work_dir: &Path,
    credentials: Option<&ConnectionCredentials>,
) -> Result<(), SyncError> {
    let id = task_set.datasource_id.as_str();
    let scratch = scratch_dir(work_dir).await?;

    tracing::info!(
        datasource_id = id,
        datasource = %task_set.datasource_name,
        project = %task_set.project,
        "downloading datasource"
    );
    let path = provider.download(id, true, scratch.path()).await?;
    let document = Document::open_path(&path)?;

    tracing::info!(datasource_id = id, tasks = task_set.len(), "updating datasource");
    let bytes = applier::apply(task_set, document)?;
    tokio::fs::write(&path, bytes).await?;

    tracing::info!(datasource_id = id, path = %path.display(), "publishing datasource");
    provider.publish(&path, id, credentials).await?;
    tracing::info!(datasource_id = id, datasource = %task_set.datasource_name, "published");
    Ok(())
}
