use crate::cli::GlobalFlags;
use crate::cli::root_commands::TaskFileArgs;
use crate::commands::shared::task_file::read_task_sets;
use crate::context::AppContext;
use crate::output::output;

/// Handle `tdsync refresh`.
pub async fn handle(
    args: &TaskFileArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let task_sets = read_task_sets(&args.tasks)?;
    let report = ctx.coordinator.refresh(&task_sets).await?;
    output(&report, flags.format)
}
