//! Convergence and platform error types.

use serde::Serialize;
use tds_core::CoreError;
use tds_file::FileError;
use thiserror::Error;

/// Message the platform answers with when a refresh for the datasource is
/// already queued.
pub const DUPLICATE_REFRESH_MESSAGE: &str = "Not queuing a duplicate.";

/// Errors reported by the platform a provider talks to.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// A refresh for the datasource is already queued. Callers treat this as success.
    #[error("refresh already queued")]
    DuplicateRefresh,

    /// The platform rejected a publish because the artifact changed underneath.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("timed out: {0}")]
    Timeout(String),

    /// The datasource id does not exist on the platform.
    #[error("datasource not found: {0}")]
    NotFound(String),

    #[error("provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Classify a raw platform error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains(DUPLICATE_REFRESH_MESSAGE) {
            Self::DuplicateRefresh
        } else {
            Self::Other(message)
        }
    }

    #[must_use]
    pub const fn is_duplicate_refresh(&self) -> bool {
        matches!(self, Self::DuplicateRefresh)
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(error: std::io::Error) -> Self {
        Self::Other(error.to_string())
    }
}

/// One datasource that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasourceFailure {
    pub datasource_id: String,
    pub datasource: String,
    pub error: String,
}

fn list_failures(failures: &[DatasourceFailure]) -> String {
    failures
        .iter()
        .map(|failure| {
            format!(
                "{} ({}): {}",
                failure.datasource, failure.datasource_id, failure.error
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while planning, applying or coordinating a run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The desired-state source or connection resolver failed.
    #[error("collaborator failed: {0}")]
    Collaborator(Box<dyn std::error::Error + Send + Sync>),

    /// The document lacks something planning needs.
    #[error("datasource {datasource} cannot be planned: {reason}")]
    Unplannable { datasource: String, reason: String },

    /// At least one datasource failed; every one of them is listed.
    #[error("{} datasource(s) failed: {}", .failures.len(), list_failures(.failures))]
    Aggregate { failures: Vec<DatasourceFailure> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn duplicate_refresh_is_recognized_from_platform_message() {
        let error = ProviderError::from_message(
            "400093: Bad request. Not queuing a duplicate. Refresh already scheduled.",
        );
        assert!(error.is_duplicate_refresh());
        assert!(!ProviderError::from_message("server exploded").is_duplicate_refresh());
    }

    #[test]
    fn aggregate_names_every_failure() {
        let error = SyncError::Aggregate {
            failures: vec![
                DatasourceFailure {
                    datasource_id: "ds-2".into(),
                    datasource: "Returns".into(),
                    error: "boom".into(),
                },
                DatasourceFailure {
                    datasource_id: "ds-5".into(),
                    datasource: "Stock".into(),
                    error: "bang".into(),
                },
            ],
        };
        assert_eq!(
            error.to_string(),
            "2 datasource(s) failed: Returns (ds-2): boom; Stock (ds-5): bang"
        );
    }
}
