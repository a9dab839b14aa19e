use anyhow::Context;

use crate::cli::GlobalFlags;

/// Load `.env` from the working directory, then the layered configuration.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<tds_config::SyncConfig> {
    match dotenvy::dotenv() {
        Err(error) if !error.not_found() => {
            tracing::warn!(%error, "failed to read .env; continuing without it");
        }
        _ => {}
    }

    tds_config::SyncConfig::load_from(flags.config.as_deref())
        .context("failed to load tdsync configuration")
}
