//! Platform location configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlatformConfig {
    /// Root directory of the directory-backed platform. Artifacts live at
    /// `<root>/<project>/<name>.tdsx`.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Scratch root for downloaded artifacts. Defaults to the OS temp dir.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

impl PlatformConfig {
    pub const fn is_configured(&self) -> bool {
        self.root.is_some()
    }

    /// Directory under which per-run scratch directories are created.
    #[must_use]
    pub fn work_root(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = PlatformConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.work_root(), std::env::temp_dir());
    }

    #[test]
    fn download_dir_overrides_temp_dir() {
        let config = PlatformConfig {
            download_dir: Some(PathBuf::from("/var/tmp/tdsync")),
            ..Default::default()
        };
        assert_eq!(config.work_root(), PathBuf::from("/var/tmp/tdsync"));
    }
}
