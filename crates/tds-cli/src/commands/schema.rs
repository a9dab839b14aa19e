use std::collections::BTreeMap;

use schemars::{Schema, schema_for};
use tds_config::DesiredState;
use tds_core::TaskSet;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{SchemaArgs, SchemaKind};
use crate::output;

fn schema(kind: SchemaKind) -> Schema {
    match kind {
        SchemaKind::Desired => schema_for!(DesiredState),
        SchemaKind::Tasks => schema_for!(BTreeMap<String, TaskSet>),
    }
}

/// Handle `tdsync schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    output::output(&schema(args.kind), flags.format)
}
