//! Apply a task set to a document.
//!
//! Tasks run in `TaskKind::APPLY_ORDER`: metadata first, folder deletes
//! last. A failing task aborts the rest of the set.

use tds_core::{Task, TaskAttributes, TaskKind, TaskSet};
use tds_file::{Column, Document};

use crate::error::SyncError;

/// Apply every task in `task_set` to `document`.
pub fn apply_tasks(task_set: &TaskSet, document: &mut Document) -> Result<(), SyncError> {
    task_set.validate()?;
    for task in task_set.in_apply_order() {
        apply_task(task, document)?;
    }
    tracing::info!(
        datasource_id = %task_set.datasource_id,
        datasource = %task_set.datasource_name,
        tasks = task_set.len(),
        "applied task set"
    );
    Ok(())
}

/// Apply `task_set` and return the serialized artifact.
pub fn apply(task_set: &TaskSet, mut document: Document) -> Result<Vec<u8>, SyncError> {
    apply_tasks(task_set, &mut document)?;
    Ok(document.save()?)
}

fn apply_task(task: &Task, document: &mut Document) -> Result<(), SyncError> {
    tracing::debug!(
        kind = %task.kind,
        datasource_id = %task.datasource_id,
        comparison = ?task.comparison,
        "applying task"
    );
    match (&task.attributes, task.kind) {
        (TaskAttributes::Connection(expected), TaskKind::UpdateConnection) => {
            document.update_connection(expected)?;
        }
        (TaskAttributes::Metadata(metadata), TaskKind::AddMetadata) => {
            document.add_metadata(metadata)?;
        }
        (TaskAttributes::Folder(folder), TaskKind::AddFolder) => {
            document.add_folder(&folder.name)?;
        }
        (TaskAttributes::Folder(folder), TaskKind::DeleteFolder) => {
            let removed = document.delete_folder(&folder.name)?;
            tracing::debug!(folder = %removed.name, items = removed.items.len(), "deleted folder");
        }
        (TaskAttributes::Column(column), TaskKind::AddColumn | TaskKind::ModifyColumn) => {
            document.enforce_column(
                Column::from(column),
                column.folder_name.as_deref(),
                column.remote_name.as_deref(),
            )?;
        }
        // `TaskSet::validate` has already rejected mismatched payloads.
        _ => task.validate()?,
    }
    Ok(())
}
