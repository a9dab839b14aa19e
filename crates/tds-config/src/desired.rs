//! Desired-state file loading.
//!
//! The file declares every managed datasource:
//!
//! ```toml
//! [[datasources]]
//! name = "Orders"
//! project = "Finance"
//!
//! [[datasources.folders]]
//! name = "Money"
//!
//! [[datasources.columns]]
//! name = "AMOUNT"
//! caption = "Amount"
//! persona = "continuous_decimal_measure"
//! folder = "Money"
//! remote_name = "AMOUNT_USD"
//! ```
//!
//! The same shape is accepted as JSON. Column names are bracketed on load.

use std::collections::BTreeSet;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tds_core::{ConfigDatasource, CoreError};

use crate::error::ConfigError;

/// Every managed datasource, as declared in the desired-state file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DesiredState {
    #[serde(default)]
    pub datasources: Vec<ConfigDatasource>,
}

impl DesiredState {
    /// Read a `.toml` or `.json` desired-state file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        let state = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "run.desired_state".into(),
                    reason: format!("{} is neither .toml nor .json", path.display()),
                });
            }
        };
        tracing::debug!(
            path = %path.display(),
            datasources = state.datasources.len(),
            "loaded desired state"
        );
        Ok(state)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(text)?.normalized()
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(text)?.normalized()
    }

    /// Normalize names and reject duplicates.
    fn normalized(self) -> Result<Self, ConfigError> {
        let datasources: Vec<ConfigDatasource> = self
            .datasources
            .into_iter()
            .map(ConfigDatasource::normalized)
            .collect();

        let mut seen = BTreeSet::new();
        for datasource in &datasources {
            if !seen.insert((datasource.project.as_str(), datasource.name.as_str())) {
                return Err(CoreError::duplicate(
                    "datasource",
                    format!("{}/{}", datasource.project, datasource.name),
                )
                .into());
            }
            let mut columns = BTreeSet::new();
            for column in &datasource.columns {
                if !columns.insert(column.name.as_str()) {
                    return Err(CoreError::duplicate(
                        "column",
                        format!("{} in {}", column.name, datasource.name),
                    )
                    .into());
                }
            }
        }
        Ok(Self { datasources })
    }

    #[must_use]
    pub fn datasource(&self, name: &str) -> Option<&ConfigDatasource> {
        self.datasources
            .iter()
            .find(|datasource| datasource.name == name)
    }
}
