//! Convergence planning: compare a desired datasource against its live
//! document and list the tasks that close the gap.
//!
//! Planning never mutates the document. Running it against a document that
//! already matches the desired state yields an empty task set.

use std::collections::BTreeMap;

use serde_json::json;
use tds_core::names::bracketed;
use tds_core::{
    ConfigColumn, ConfigDatasource, ConnectionField, ExpectedConnection, FolderTask, MetadataSpec,
    MetadataTask, Task, TaskAttributes, TaskKind, TaskSet,
};
use tds_file::{Connection, Document};

use crate::error::SyncError;

/// Relation name used for the extract mirror when its connection names none.
const DEFAULT_EXTRACT_RELATION: &str = "Extract";

/// Plan one datasource.
///
/// `expected` carries the connection attributes to enforce; `None` leaves
/// the connection alone.
pub fn plan(
    desired: &ConfigDatasource,
    datasource_id: &str,
    document: &Document,
    expected: Option<&ExpectedConnection>,
) -> Result<TaskSet, SyncError> {
    let mut tasks = TaskSet::new(datasource_id, desired.name.clone(), desired.project.clone());

    if let Some(expected) = expected {
        plan_connection(&mut tasks, desired, document, expected)?;
    }
    plan_folders(&mut tasks, desired, document)?;
    audit_metadata(desired, document);

    let mut queued_metadata = 0;
    for column in &desired.columns {
        plan_column(&mut tasks, desired, document, column, &mut queued_metadata)?;
    }

    tracing::info!(
        datasource_id,
        datasource = %desired.name,
        tasks = tasks.len(),
        "planned datasource"
    );
    Ok(tasks)
}

/// Plan every resolved datasource that has a live document.
///
/// Datasources without an id, without a document, or whose planning fails
/// are logged and left out of the result.
pub fn plan_all(
    desired: &[ConfigDatasource],
    live: &BTreeMap<String, Document>,
    expected: Option<&ExpectedConnection>,
) -> BTreeMap<String, TaskSet> {
    let mut planned = BTreeMap::new();
    for datasource in desired {
        let Some(id) = datasource.id.as_deref() else {
            tracing::error!(
                datasource = %datasource.name,
                project = %datasource.project,
                "datasource not found on the platform, skipping"
            );
            continue;
        };
        let Some(document) = live.get(id) else {
            tracing::error!(
                datasource_id = id,
                datasource = %datasource.name,
                "no live document for datasource, skipping"
            );
            continue;
        };
        match plan(datasource, id, document, expected) {
            Ok(tasks) => {
                planned.insert(id.to_string(), tasks);
            }
            Err(error) => tracing::error!(
                datasource_id = id,
                datasource = %datasource.name,
                %error,
                "planning failed, skipping"
            ),
        }
    }
    planned
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

fn plan_connection(
    tasks: &mut TaskSet,
    desired: &ConfigDatasource,
    document: &Document,
    expected: &ExpectedConnection,
) -> Result<(), SyncError> {
    let Some(named) = document
        .connection
        .as_ref()
        .and_then(|connection| connection.named_connection(&expected.class_name))
    else {
        tracing::warn!(
            datasource = %desired.name,
            class = %expected.class_name,
            "no named connection of the expected class, leaving connection alone"
        );
        return Ok(());
    };

    let mut differences = serde_json::Map::new();
    if let Some(server) = expected.server.as_deref() {
        if named.caption.as_deref() != Some(server) {
            differences.insert(
                "caption".into(),
                json!({ "live": named.caption, "expected": server }),
            );
        }
    }
    for (field, value) in expected.present() {
        if field == ConnectionField::ClassName {
            continue;
        }
        // An attribute the live connection leaves unset is not drift.
        let live = named.get(field);
        if live.is_some_and(|live| !live.eq_ignore_ascii_case(value)) {
            differences.insert(
                field.as_str().into(),
                json!({ "live": live, "expected": value }),
            );
        }
    }
    if differences.is_empty() {
        return Ok(());
    }

    tracing::info!(
        datasource = %desired.name,
        named_connection = %named.name,
        differences = %serde_json::Value::Object(differences.clone()),
        "connection differs"
    );
    tasks.push(
        Task::new(
            TaskKind::UpdateConnection,
            tasks.datasource_id.clone(),
            TaskAttributes::Connection(expected.clone()),
        )?
        .with_comparison(serde_json::Value::Object(differences)),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Folders
// ---------------------------------------------------------------------------

fn folder_task(tasks: &TaskSet, kind: TaskKind, name: &str) -> Result<Task, SyncError> {
    Ok(Task::new(
        kind,
        tasks.datasource_id.clone(),
        TaskAttributes::Folder(FolderTask { name: name.to_string() }),
    )?)
}

fn plan_folders(
    tasks: &mut TaskSet,
    desired: &ConfigDatasource,
    document: &Document,
) -> Result<(), SyncError> {
    let wanted = desired.desired_folder_names();
    let live = document.folder_names();

    for name in live.iter().filter(|name| !wanted.contains(*name)) {
        tracing::info!(datasource = %desired.name, folder = %name, "folder not desired");
        let task = folder_task(tasks, TaskKind::DeleteFolder, name)?;
        tasks.push(task)?;
    }
    for name in wanted.iter().filter(|name| !live.contains(*name)) {
        tracing::info!(datasource = %desired.name, folder = %name, "folder missing");
        let task = folder_task(tasks, TaskKind::AddFolder, name)?;
        tasks.push(task)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

fn audit_metadata(desired: &ConfigDatasource, document: &Document) {
    let Some(metadata) = document
        .connection
        .as_ref()
        .and_then(|connection| connection.metadata.as_ref())
    else {
        return;
    };
    for record in metadata.records.iter() {
        if !desired.references_remote_name(&record.remote_name) {
            tracing::warn!(
                datasource = %desired.name,
                remote_name = %record.remote_name,
                local_name = record.local_name.as_deref().unwrap_or_default(),
                "remote field is not mapped by any desired column"
            );
        }
    }
}

fn primary_connection<'a>(
    desired: &ConfigDatasource,
    document: &'a Document,
) -> Result<&'a Connection, SyncError> {
    document
        .connection
        .as_ref()
        .ok_or_else(|| SyncError::Unplannable {
            datasource: desired.name.clone(),
            reason: "document has no connection".into(),
        })
}

fn metadata_task(
    desired: &ConfigDatasource,
    document: &Document,
    column: &ConfigColumn,
    remote_name: &str,
    queued: u32,
) -> Result<MetadataTask, SyncError> {
    let connection = primary_connection(desired, document)?;
    let relation = connection
        .relation_name()
        .ok_or_else(|| SyncError::Unplannable {
            datasource: desired.name.clone(),
            reason: "connection has no relation to attach metadata to".into(),
        })?;
    let ordinal = |connection: &Connection| {
        u32::try_from(connection.metadata_count())
            .unwrap_or(u32::MAX)
            .saturating_add(queued)
    };
    let primary = MetadataSpec {
        remote_name: remote_name.to_string(),
        local_name: column.name.clone(),
        parent_name: bracketed(relation),
        ordinal: ordinal(connection),
        local_type: column.datatype,
        family: None,
    };
    let extract = document.extract_connection().map(|extract| MetadataSpec {
        parent_name: bracketed(extract.relation_name().unwrap_or(DEFAULT_EXTRACT_RELATION)),
        ordinal: ordinal(extract),
        family: Some(relation.to_string()),
        ..primary.clone()
    });
    Ok(MetadataTask {
        connection: primary,
        extract,
    })
}

/// Whether a connection's record for `remote_name` points at `local_name`,
/// and whether the mapping table still needs an entry for it.
fn claim_state(connection: &Connection, local_name: &str, remote_name: &str) -> (bool, bool) {
    let Some(record) = connection.metadata_record(remote_name) else {
        return (true, false);
    };
    let update_needed = record.local_name.as_deref() != Some(local_name);
    let needs_mapping = connection.mapping_required(local_name, remote_name)
        && !connection.is_mapped(local_name, remote_name);
    (update_needed, needs_mapping)
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

fn plan_column(
    tasks: &mut TaskSet,
    desired: &ConfigDatasource,
    document: &Document,
    column: &ConfigColumn,
    queued_metadata: &mut u32,
) -> Result<(), SyncError> {
    let mut metadata_update_needed = false;
    let mut needs_mapping = false;

    if let Some(remote_name) = column
        .remote_name
        .as_deref()
        .filter(|_| !column.is_calculated())
    {
        let connection = primary_connection(desired, document)?;
        if connection.metadata_record(remote_name).is_none() {
            let task = metadata_task(desired, document, column, remote_name, *queued_metadata)?;
            tracing::info!(
                datasource = %desired.name,
                column = %column.name,
                remote_name,
                ordinal = task.connection.ordinal,
                "metadata record missing"
            );
            tasks.push(Task::new(
                TaskKind::AddMetadata,
                tasks.datasource_id.clone(),
                TaskAttributes::Metadata(task),
            )?)?;
            *queued_metadata += 1;
        } else {
            let claims = std::iter::once(connection).chain(document.extract_connection());
            for connection in claims {
                let (update, mapping) = claim_state(connection, &column.name, remote_name);
                metadata_update_needed |= update;
                needs_mapping |= mapping;
            }
        }
    }

    let Some(live) = document.columns.get(&column.name) else {
        tracing::info!(datasource = %desired.name, column = %column.name, "column missing");
        tasks.push(Task::new(
            TaskKind::AddColumn,
            tasks.datasource_id.clone(),
            TaskAttributes::Column(column.clone()),
        )?)?;
        return Ok(());
    };

    let diff = live.diff(column);
    let not_in_folder = column.folder_name.as_deref().is_some_and(|folder| {
        document
            .folder(folder)
            .is_none_or(|folder| !folder.contains(&column.name))
    });

    if diff.is_empty() && !not_in_folder && !metadata_update_needed && !needs_mapping {
        return Ok(());
    }

    let comparison = json!({
        "diff": diff,
        "not_in_folder": not_in_folder,
        "current_folder": document.folder_of(&column.name),
        "metadata_update_needed": metadata_update_needed,
        "needs_mapping": needs_mapping,
    });
    tracing::info!(
        datasource = %desired.name,
        column = %column.name,
        comparison = %comparison,
        "column differs"
    );
    tasks.push(
        Task::new(
            TaskKind::ModifyColumn,
            tasks.datasource_id.clone(),
            TaskAttributes::Column(column.clone()),
        )?
        .with_comparison(comparison),
    )?;
    Ok(())
}
