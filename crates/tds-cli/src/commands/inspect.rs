use anyhow::Context;
use tds_file::Document;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InspectArgs;
use crate::output;

/// Handle `tdsync inspect`.
pub fn handle(args: &InspectArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let document = Document::open_path(&args.artifact)
        .with_context(|| format!("failed to open {}", args.artifact.display()))?;
    output::output(&document.summary(), flags.format)
}
