use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Compare the desired state against live datasources and write task sets.
    Plan(PlanArgs),
    /// Apply and publish previously planned task sets.
    Apply(TaskFileArgs),
    /// Queue extract refreshes for the datasources in a task file.
    Refresh(TaskFileArgs),
    /// Plan, apply, publish and refresh in one pass.
    Run(RunArgs),
    /// Print a summary of a datasource artifact.
    Inspect(InspectArgs),
    /// Print the JSON schema of the desired-state or task-set format.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct PlanArgs {
    /// Desired-state file (defaults to [run] desired_state)
    #[arg(short, long)]
    pub desired: Option<PathBuf>,

    /// Write the task sets here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct TaskFileArgs {
    /// Task sets written by `tdsync plan`
    pub tasks: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Desired-state file (defaults to [run] desired_state)
    #[arg(short, long)]
    pub desired: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct InspectArgs {
    /// A .tds or .tdsx artifact
    pub artifact: PathBuf,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaKind {
    /// The desired-state file.
    Desired,
    /// The task-set file written by `plan`.
    Tasks,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    #[arg(value_enum, default_value = "desired")]
    pub kind: SchemaKind,
}
