//! Run behavior configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_desired_state() -> PathBuf {
    PathBuf::from("datasources.toml")
}

const fn default_max_concurrency() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Desired-state file (TOML or JSON).
    #[serde(default = "default_desired_state")]
    pub desired_state: PathBuf,

    /// Datasource names that are never downloaded or published.
    #[serde(default)]
    pub excluded: Vec<String>,

    /// Datasource names that are never refreshed.
    #[serde(default)]
    pub no_refresh: Vec<String>,

    /// Datasources processed at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            desired_state: default_desired_state(),
            excluded: Vec::new(),
            no_refresh: Vec::new(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl RunConfig {
    pub fn is_excluded(&self, datasource_name: &str) -> bool {
        self.excluded.iter().any(|name| name == datasource_name)
    }

    pub fn skips_refresh(&self, datasource_name: &str) -> bool {
        self.no_refresh.iter().any(|name| name == datasource_name)
    }
}
