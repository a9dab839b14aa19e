use crate::cli::GlobalFlags;
use crate::cli::root_commands::RunArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `tdsync run`.
pub async fn handle(args: &RunArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let desired = ctx.desired_state(args.desired.as_deref())?;
    let report = ctx.coordinator.run(&desired, &ctx.config.connection).await?;
    output(&report, flags.format)
}
