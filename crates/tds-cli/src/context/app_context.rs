use std::path::Path;

use anyhow::Context;
use tds_config::{DesiredState, SyncConfig};
use tds_sync::{DirectoryProvider, RunCoordinator, RunOptions};

use crate::cli::GlobalFlags;

/// Configuration plus the coordinator every platform command runs through.
pub struct AppContext {
    pub config: SyncConfig,
    pub coordinator: RunCoordinator<DirectoryProvider>,
}

impl AppContext {
    /// Resolve the platform root (`--platform` wins over `[platform] root`)
    /// and build the coordinator over it.
    pub fn init(config: SyncConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        let root = match flags.platform.as_deref() {
            Some(root) => root.to_path_buf(),
            None => config
                .platform_root()
                .context("no platform root; pass --platform or set [platform] root")?
                .to_path_buf(),
        };
        anyhow::ensure!(
            root.is_dir(),
            "platform root '{}' is not a directory",
            root.display()
        );
        tracing::debug!(root = %root.display(), "using directory platform");

        let coordinator =
            RunCoordinator::new(DirectoryProvider::new(root), RunOptions::from_config(&config));
        Ok(Self {
            config,
            coordinator,
        })
    }

    /// The desired state from `path`, or from `[run] desired_state`.
    pub fn desired_state(&self, path: Option<&Path>) -> anyhow::Result<DesiredState> {
        let path = path.unwrap_or(&self.config.run.desired_state);
        DesiredState::load(path)
            .with_context(|| format!("failed to load desired state from {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::cli::OutputFormat;

    use super::*;

    fn flags(platform: Option<PathBuf>) -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Json,
            config: None,
            platform,
        }
    }

    #[test]
    fn platform_flag_overrides_config() {
        let configured = tempfile::TempDir::new().unwrap();
        let flagged = tempfile::TempDir::new().unwrap();
        let mut config = SyncConfig::default();
        config.platform.root = Some(configured.path().to_path_buf());

        let ctx = AppContext::init(config, &flags(Some(flagged.path().to_path_buf()))).unwrap();
        assert_eq!(ctx.coordinator.provider().root(), flagged.path());
    }

    #[test]
    fn missing_platform_root_is_an_error() {
        let error = AppContext::init(SyncConfig::default(), &flags(None))
            .err()
            .unwrap();
        assert!(error.to_string().contains("no platform root"));
    }

    #[test]
    fn platform_root_must_be_a_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "").unwrap();
        assert!(AppContext::init(SyncConfig::default(), &flags(Some(file))).is_err());
    }

    #[test]
    fn desired_state_defaults_to_run_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("datasources.toml");
        std::fs::write(
            &path,
            "[[datasources]]\nname = \"Orders\"\nproject = \"Finance\"\n",
        )
        .unwrap();
        let mut config = SyncConfig::default();
        config.run.desired_state = path;

        let ctx = AppContext::init(config, &flags(Some(dir.path().to_path_buf()))).unwrap();
        let desired = ctx.desired_state(None).unwrap();
        assert_eq!(desired.datasources.len(), 1);
        assert_eq!(desired.datasources[0].name, "Orders");
    }
}
