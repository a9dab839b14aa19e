use anyhow::Context;
use serde::Serialize;
use tds_core::TaskSet;
use tds_sync::ConnectionResolver;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::PlanArgs;
use crate::context::AppContext;
use crate::output;

#[derive(Debug, Serialize)]
struct PlanSummary {
    datasources: usize,
    with_work: usize,
    tasks: usize,
    out: String,
}

/// Handle `tdsync plan`.
pub async fn handle(
    args: &PlanArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let desired = ctx.desired_state(args.desired.as_deref())?;
    let expected = ctx
        .config
        .connection
        .resolve_connection()
        .context("failed to resolve the expected connection")?;

    let resolved = ctx.coordinator.resolve(desired.datasources).await?;
    let task_sets = ctx.coordinator.plan(&resolved, expected.as_ref()).await;
    tracing::info!(
        resolved = resolved.len(),
        planned = task_sets.len(),
        tasks = task_sets.values().map(TaskSet::len).sum::<usize>(),
        "planning complete"
    );

    let Some(path) = args.out.as_deref() else {
        return output::output(&task_sets, flags.format);
    };
    output::write_or_print(&task_sets, Some(path), flags.format)?;
    output::output(
        &PlanSummary {
            datasources: task_sets.len(),
            with_work: task_sets.values().filter(|set| !set.is_empty()).count(),
            tasks: task_sets.values().map(TaskSet::len).sum(),
            out: path.display().to_string(),
        },
        flags.format,
    )
}
