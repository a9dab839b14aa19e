//! Seams to the collaborators a run depends on: the platform holding the
//! artifacts, the desired-state source and the connection attribute source.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tds_config::{ConfigError, ConnectionConfig, DesiredState};
use tds_core::{ConfigDatasource, ConnectionCredentials, ExpectedConnection};

use crate::error::ProviderError;

/// A live datasource as the platform lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project: String,
}

impl DatasourceRef {
    /// Whether a desired datasource refers to this one. A desired datasource
    /// without a project matches by name alone.
    #[must_use]
    pub fn matches(&self, desired: &ConfigDatasource) -> bool {
        self.name == desired.name && (desired.project.is_empty() || self.project == desired.project)
    }
}

/// The platform that stores, publishes and refreshes artifacts.
///
/// Timeouts and retries are the implementation's business. Calls may run
/// concurrently for different datasources.
pub trait DatasourceProvider: Send + Sync {
    fn resolve_datasources(
        &self,
    ) -> impl Future<Output = Result<Vec<DatasourceRef>, ProviderError>> + Send;

    /// Fetch the artifact into `dir` and return its path.
    fn download(
        &self,
        id: &str,
        include_extract: bool,
        dir: &Path,
    ) -> impl Future<Output = Result<PathBuf, ProviderError>> + Send;

    fn publish(
        &self,
        path: &Path,
        id: &str,
        credentials: Option<&ConnectionCredentials>,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Queue an extract refresh. Fails with `ProviderError::DuplicateRefresh`
    /// when one is already queued.
    fn refresh_extract(&self, id: &str) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Where desired datasources come from.
pub trait DesiredStateSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load_config(&self) -> Result<Vec<ConfigDatasource>, Self::Error>;
}

/// Where the expected source-system connection attributes come from.
pub trait ConnectionResolver {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `None` when connection attributes are not managed.
    fn resolve_connection(&self) -> Result<Option<ExpectedConnection>, Self::Error>;
}

impl DesiredStateSource for DesiredState {
    type Error = ConfigError;

    fn load_config(&self) -> Result<Vec<ConfigDatasource>, ConfigError> {
        Ok(self.datasources.clone())
    }
}

impl ConnectionResolver for ConnectionConfig {
    type Error = ConfigError;

    fn resolve_connection(&self) -> Result<Option<ExpectedConnection>, ConfigError> {
        Ok(self.is_configured().then(|| self.expected()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(name: &str, project: &str) -> DatasourceRef {
        DatasourceRef {
            id: format!("{project}/{name}"),
            name: name.into(),
            project: project.into(),
        }
    }

    #[test]
    fn desired_without_project_matches_by_name() {
        let desired = ConfigDatasource {
            name: "Orders".into(),
            ..Default::default()
        };
        assert!(live("Orders", "Finance").matches(&desired));
        assert!(!live("Returns", "Finance").matches(&desired));
    }

    #[test]
    fn desired_project_must_match() {
        let desired = ConfigDatasource {
            name: "Orders".into(),
            project: "Finance".into(),
            ..Default::default()
        };
        assert!(live("Orders", "Finance").matches(&desired));
        assert!(!live("Orders", "Sandbox").matches(&desired));
    }

    #[test]
    fn unconfigured_connection_is_not_managed() {
        let config = ConnectionConfig::default();
        assert_eq!(config.resolve_connection().unwrap(), None);
        let config = ConnectionConfig {
            warehouse: "WH_XS".into(),
            ..Default::default()
        };
        assert!(config.resolve_connection().unwrap().is_some());
    }
}
