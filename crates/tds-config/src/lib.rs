//! # tds-config
//!
//! Layered runtime configuration for tdsync using figment, plus the
//! desired-state file loader.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TDSYNC_*` prefix, `__` as separator)
//! 2. Project-level `./tdsync.toml` (or an explicit path)
//! 3. User-level `~/.config/tdsync/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `TDSYNC_CONNECTION__WAREHOUSE` -> `connection.warehouse`,
//! `TDSYNC_RUN__MAX_CONCURRENCY` -> `run.max_concurrency`, etc. List values use
//! figment's array syntax: `TDSYNC_RUN__EXCLUDED='["Orders", "Returns"]'`.
//!
//! # Usage
//!
//! ```no_run
//! use tds_config::{DesiredState, SyncConfig};
//!
//! let config = SyncConfig::load_with_dotenv().expect("config");
//! let desired = DesiredState::load(&config.run.desired_state).expect("desired state");
//! let expected = config.connection.expected();
//! ```

mod connection;
mod desired;
mod error;
mod platform;
mod run;

pub use connection::{ConnectionConfig, CredentialsConfig};
pub use desired::DesiredState;
pub use error::ConfigError;
pub use platform::PlatformConfig;
pub use run::RunConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-level config file, relative to the working directory.
pub const PROJECT_CONFIG_FILE: &str = "tdsync.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl SyncConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`Self::load`], with `path` replacing `./tdsync.toml` as the
    /// project-level file. An explicit path must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path.filter(|path| !path.exists()) {
            return Err(ConfigError::InvalidValue {
                field: "--config".into(),
                reason: format!("{} does not exist", path.display()),
            });
        }
        let config: Self = Self::figment_with(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// Loads `.env` from the current directory (if any) before building the figment.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain with the default project file.
    pub fn figment() -> Figment {
        Self::figment_with(None)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment_with(project_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = project_file
            .map_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE), Path::to_path_buf);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("TDSYNC_").split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tdsync").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.run.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "run.max_concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.connection.class_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "connection.class_name".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// The platform root, or `NotConfigured` when it is missing.
    pub fn platform_root(&self) -> Result<&Path, ConfigError> {
        self.platform
            .root
            .as_deref()
            .ok_or_else(|| ConfigError::NotConfigured {
                section: "platform".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = SyncConfig::default();
        assert!(!config.platform.is_configured());
        assert!(!config.connection.is_configured());
        assert_eq!(config.connection.class_name, "snowflake");
        assert_eq!(config.run.max_concurrency, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_platform_root_is_not_configured() {
        let config = SyncConfig::default();
        assert!(matches!(
            config.platform_root(),
            Err(ConfigError::NotConfigured { .. })
        ));
    }

    #[test]
    fn zero_concurrency_is_invalid() {
        let mut config = SyncConfig::default();
        config.run.max_concurrency = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
