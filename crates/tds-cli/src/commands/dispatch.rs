use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Plan(args) => commands::plan::handle(&args, ctx, flags).await,
        Commands::Apply(args) => commands::apply::handle(&args, ctx, flags).await,
        Commands::Refresh(args) => commands::refresh::handle(&args, ctx, flags).await,
        Commands::Run(args) => commands::run::handle(&args, ctx, flags).await,
        Commands::Inspect(_) | Commands::Schema(_) => {
            unreachable!("inspect/schema are pre-dispatched in main")
        }
    }
}
