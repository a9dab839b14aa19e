use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `tdsync` binary.
#[derive(Debug, Parser)]
#[command(
    name = "tdsync",
    version,
    about = "Keep published datasource artifacts in line with a declared desired state"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Configuration file (defaults to ./tdsync.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory-backed platform root (overrides [platform] root)
    #[arg(long, global = true)]
    pub platform: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            config: self.config.clone(),
            platform: self.platform.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::{Cli, Commands, OutputFormat};
    use crate::cli::root_commands::SchemaKind;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tdsync",
            "plan",
            "--desired",
            "state.toml",
            "--format",
            "raw",
            "--platform",
            "/srv/platform",
            "-v",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.verbose);
        let flags = cli.global_flags();
        assert_eq!(flags.platform, Some(PathBuf::from("/srv/platform")));
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.desired, Some(PathBuf::from("state.toml")));
        assert_eq!(args.out, None);
    }

    #[test]
    fn apply_requires_a_task_file() {
        assert!(Cli::try_parse_from(["tdsync", "apply"]).is_err());
        let cli = Cli::try_parse_from(["tdsync", "apply", "tasks.json"]).expect("cli should parse");
        assert!(matches!(cli.command, Commands::Apply(_)));
    }

    #[test]
    fn schema_defaults_to_desired_state() {
        let cli = Cli::try_parse_from(["tdsync", "schema"]).expect("cli should parse");
        let Commands::Schema(args) = cli.command else {
            panic!("expected schema");
        };
        assert_eq!(args.kind, SchemaKind::Desired);
    }
}
