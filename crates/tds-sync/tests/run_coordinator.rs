//! Coordinator behavior against an in-memory platform and a directory-backed one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pretty_assertions::assert_eq;
use tds_config::{ConnectionConfig, DesiredState};
use tds_core::{ConfigColumn, ConfigDatasource, ConnectionCredentials};
use tds_file::Document;
use tds_sync::{
    DatasourceProvider, DatasourceRef, DirectoryProvider, ProviderError, RunCoordinator,
    RunOptions, SyncError,
};
use tempfile::TempDir;

const DOC: &str = "<datasource>\n  \
    <column caption='Region' datatype='string' name='[REGION]' role='dimension' type='nominal' />\n\
    </datasource>\n";

#[derive(Default)]
struct FakePlatform {
    live: Vec<DatasourceRef>,
    artifacts: Mutex<BTreeMap<String, String>>,
    reject_publish: Vec<String>,
    crash_on_download: Vec<String>,
    crash_on_publish: Vec<String>,
    already_queued: Vec<String>,
    published: Mutex<Vec<String>>,
    refreshed: Mutex<Vec<String>>,
}

impl FakePlatform {
    fn with(names: &[&str]) -> Self {
        let live: Vec<DatasourceRef> = names
            .iter()
            .map(|name| DatasourceRef {
                id: format!("ds-{}", name.to_lowercase()),
                name: (*name).to_string(),
                project: "Finance".into(),
            })
            .collect();
        let artifacts = live
            .iter()
            .map(|datasource| (datasource.id.clone(), DOC.to_string()))
            .collect();
        Self {
            live,
            artifacts: Mutex::new(artifacts),
            ..Self::default()
        }
    }

    fn artifact(&self, id: &str) -> String {
        self.artifacts.lock().unwrap()[id].clone()
    }
}

impl DatasourceProvider for FakePlatform {
    async fn resolve_datasources(&self) -> Result<Vec<DatasourceRef>, ProviderError> {
        Ok(self.live.clone())
    }

    async fn download(
        &self,
        id: &str,
        _include_extract: bool,
        dir: &Path,
    ) -> Result<PathBuf, ProviderError> {
        if self.crash_on_download.iter().any(|crashing| crashing == id) {
            panic!("download of {id} crashed");
        }
        let text = self
            .artifacts
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        let path = dir.join(format!("{id}.tds"));
        std::fs::write(&path, text)?;
        Ok(path)
    }

    async fn publish(
        &self,
        path: &Path,
        id: &str,
        _credentials: Option<&ConnectionCredentials>,
    ) -> Result<(), ProviderError> {
        if self.crash_on_publish.iter().any(|crashing| crashing == id) {
            panic!("publish of {id} crashed");
        }
        if self.reject_publish.iter().any(|rejected| rejected == id) {
            return Err(ProviderError::Conflict(format!("{id} changed on the server")));
        }
        let text = std::fs::read_to_string(path)?;
        self.artifacts.lock().unwrap().insert(id.to_string(), text);
        self.published.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn refresh_extract(&self, id: &str) -> Result<(), ProviderError> {
        if self.already_queued.iter().any(|queued| queued == id) {
            return Err(ProviderError::from_message(
                "409093: Not queuing a duplicate. A refresh is already in progress.",
            ));
        }
        self.refreshed.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

fn desired(name: &str, caption: &str) -> ConfigDatasource {
    ConfigDatasource {
        id: None,
        name: name.into(),
        project: "Finance".into(),
        columns: vec![ConfigColumn {
            name: "REGION".into(),
            caption: Some(caption.into()),
            persona: Some(tds_core::Persona::StringDimension),
            ..Default::default()
        }],
        folders: Vec::new(),
    }
    .normalized()
}

fn options(work_dir: &TempDir) -> RunOptions {
    RunOptions {
        work_dir: work_dir.path().to_path_buf(),
        max_concurrency: 2,
        ..RunOptions::default()
    }
}

fn scratch_is_clean(work_dir: &TempDir) -> bool {
    std::fs::read_dir(work_dir.path()).unwrap().next().is_none()
}

#[tokio::test]
async fn resolve_drops_excluded_and_unknown_datasources() {
    let work_dir = TempDir::new().unwrap();
    let coordinator = RunCoordinator::new(
        FakePlatform::with(&["Orders", "Returns"]),
        RunOptions {
            excluded: vec!["Returns".into()],
            ..options(&work_dir)
        },
    );

    let resolved = coordinator
        .resolve(vec![
            desired("Orders", "Sales Region"),
            desired("Returns", "Sales Region"),
            desired("Ghost", "Sales Region"),
        ])
        .await
        .unwrap();

    let ids: Vec<_> = resolved.iter().map(|d| d.id.as_deref()).collect();
    assert_eq!(ids, vec![Some("ds-orders")]);
}

#[tokio::test]
async fn one_failing_datasource_does_not_stop_the_others() {
    let work_dir = TempDir::new().unwrap();
    let platform = FakePlatform {
        reject_publish: vec!["ds-returns".into()],
        ..FakePlatform::with(&["Orders", "Returns", "Stock"])
    };
    let coordinator = RunCoordinator::new(platform, options(&work_dir));

    let resolved = coordinator
        .resolve(vec![
            desired("Orders", "Sales Region"),
            desired("Returns", "Sales Region"),
            desired("Stock", "Sales Region"),
        ])
        .await
        .unwrap();
    let task_sets = coordinator.plan(&resolved, None).await;
    assert_eq!(task_sets.len(), 3);
    assert!(task_sets.values().all(|tasks| tasks.modify_column.len() == 1));

    let err = coordinator.apply(&task_sets).await.unwrap_err();
    let SyncError::Aggregate { failures } = err else {
        panic!("expected an aggregate error, got {err}");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].datasource_id, "ds-returns");
    assert_eq!(failures[0].datasource, "Returns");
    assert!(failures[0].error.contains("changed on the server"));

    let platform = coordinator.provider();
    let mut published = platform.published.lock().unwrap().clone();
    published.sort();
    assert_eq!(published, vec!["ds-orders", "ds-stock"]);
    assert_eq!(
        *platform.refreshed.lock().unwrap(),
        vec!["ds-orders", "ds-returns", "ds-stock"]
    );
    assert!(platform.artifact("ds-orders").contains("Sales Region"));
    assert!(!platform.artifact("ds-returns").contains("Sales Region"));
    assert!(scratch_is_clean(&work_dir));
}

#[tokio::test]
async fn crashed_publish_is_reported_as_a_failure() {
    let work_dir = TempDir::new().unwrap();
    let platform = FakePlatform {
        crash_on_publish: vec!["ds-returns".into()],
        ..FakePlatform::with(&["Orders", "Returns"])
    };
    let coordinator = RunCoordinator::new(platform, options(&work_dir));

    let resolved = coordinator
        .resolve(vec![
            desired("Orders", "Sales Region"),
            desired("Returns", "Sales Region"),
        ])
        .await
        .unwrap();
    let task_sets = coordinator.plan(&resolved, None).await;
    assert_eq!(task_sets.len(), 2);

    let err = coordinator.apply(&task_sets).await.unwrap_err();
    let SyncError::Aggregate { failures } = err else {
        panic!("expected an aggregate error, got {err}");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].datasource_id, "ds-returns");
    assert_eq!(failures[0].datasource, "Returns");
    assert!(failures[0].error.contains("panicked"));

    let platform = coordinator.provider();
    assert_eq!(*platform.published.lock().unwrap(), vec!["ds-orders"]);
    assert_eq!(
        *platform.refreshed.lock().unwrap(),
        vec!["ds-orders", "ds-returns"]
    );
}

#[tokio::test]
async fn crashed_download_is_left_out_of_planning() {
    let work_dir = TempDir::new().unwrap();
    let platform = FakePlatform {
        crash_on_download: vec!["ds-orders".into()],
        ..FakePlatform::with(&["Orders", "Returns"])
    };
    let coordinator = RunCoordinator::new(platform, options(&work_dir));

    let resolved = coordinator
        .resolve(vec![
            desired("Orders", "Sales Region"),
            desired("Returns", "Sales Region"),
        ])
        .await
        .unwrap();
    let task_sets = coordinator.plan(&resolved, None).await;
    assert_eq!(task_sets.keys().collect::<Vec<_>>(), vec!["ds-returns"]);
}

#[tokio::test]
async fn unreadable_artifact_is_left_out_of_planning() {
    let work_dir = TempDir::new().unwrap();
    let platform = FakePlatform::with(&["Orders", "Returns"]);
    platform
        .artifacts
        .lock()
        .unwrap()
        .insert("ds-returns".into(), "<datasource><column".into());
    let coordinator = RunCoordinator::new(platform, options(&work_dir));

    let resolved = coordinator
        .resolve(vec![
            desired("Orders", "Sales Region"),
            desired("Returns", "Sales Region"),
        ])
        .await
        .unwrap();
    let task_sets = coordinator.plan(&resolved, None).await;
    assert_eq!(task_sets.keys().collect::<Vec<_>>(), vec!["ds-orders"]);
}

#[tokio::test]
async fn duplicate_refresh_counts_as_success() {
    let work_dir = TempDir::new().unwrap();
    let platform = FakePlatform {
        already_queued: vec!["ds-orders".into()],
        ..FakePlatform::with(&["Orders", "Returns", "Stock"])
    };
    let coordinator = RunCoordinator::new(
        platform,
        RunOptions {
            no_refresh: vec!["Stock".into()],
            ..options(&work_dir)
        },
    );

    let resolved = coordinator
        .resolve(vec![
            desired("Orders", "Region"),
            desired("Returns", "Region"),
            desired("Stock", "Region"),
        ])
        .await
        .unwrap();
    let task_sets = coordinator.plan(&resolved, None).await;
    let report = coordinator.refresh(&task_sets).await.unwrap();

    assert_eq!(report.refreshed, vec!["ds-orders", "ds-returns"]);
    assert_eq!(report.refresh_skipped, vec!["ds-stock"]);
    assert_eq!(*coordinator.provider().refreshed.lock().unwrap(), vec!["ds-returns"]);
}

#[tokio::test]
async fn converged_datasources_are_not_published() {
    let work_dir = TempDir::new().unwrap();
    let coordinator = RunCoordinator::new(FakePlatform::with(&["Orders"]), options(&work_dir));

    let resolved = coordinator
        .resolve(vec![desired("Orders", "Region")])
        .await
        .unwrap();
    let task_sets = coordinator.plan(&resolved, None).await;
    let report = coordinator.apply(&task_sets).await.unwrap();

    assert_eq!(report.unchanged, vec!["ds-orders"]);
    assert!(report.published.is_empty());
    assert!(coordinator.provider().published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn directory_platform_full_run_converges() {
    let root = TempDir::new().unwrap();
    let work_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("Finance")).unwrap();
    std::fs::write(root.path().join("Finance/Orders.tds"), DOC).unwrap();

    let state = DesiredState {
        datasources: vec![desired("Orders", "Sales Region")],
    };
    let coordinator =
        RunCoordinator::new(DirectoryProvider::new(root.path()), options(&work_dir));

    let report = coordinator
        .run(&state, &ConnectionConfig::default())
        .await
        .unwrap();
    assert_eq!(report.published, vec!["Finance/Orders.tds"]);
    assert_eq!(report.refreshed, vec!["Finance/Orders.tds"]);

    let document = Document::open_path(&root.path().join("Finance/Orders.tds")).unwrap();
    let region = document.columns.get("[REGION]").unwrap();
    assert_eq!(region.caption.as_deref(), Some("Sales Region"));

    // Second run: nothing to publish, and the still-queued refresh is a duplicate.
    let report = coordinator
        .run(&state, &ConnectionConfig::default())
        .await
        .unwrap();
    assert!(report.published.is_empty());
    assert_eq!(report.unchanged, vec!["Finance/Orders.tds"]);
    assert_eq!(report.refreshed, vec!["Finance/Orders.tds"]);
    let pending = coordinator.provider().pending_refreshes().await.unwrap();
    assert_eq!(pending.len(), 1);
}
