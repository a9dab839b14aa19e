//! Tasks and per-datasource task sets.
//!
//! A `TaskSet` is the unit handed from planning to application. It is plain
//! data so it can be written out between pipeline stages and read back later.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::desired::{ConfigColumn, ExpectedConnection};
use crate::enums::{DataType, TaskKind};
use crate::errors::CoreError;

/// A metadata record to insert into one connection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MetadataSpec {
    pub remote_name: String,
    /// Column name the record maps to, e.g. `[AMOUNT]`.
    pub local_name: String,
    /// Parent relation, bracketed: `[Custom SQL Query]`.
    pub parent_name: String,
    pub ordinal: u32,
    #[serde(default)]
    pub local_type: Option<DataType>,
    /// Extract records carry the primary relation's name as their family.
    #[serde(default)]
    pub family: Option<String>,
}

/// Metadata for the primary connection and, when present, the extract mirror.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MetadataTask {
    pub connection: MetadataSpec,
    #[serde(default)]
    pub extract: Option<MetadataSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FolderTask {
    pub name: String,
}

/// Payload of a task. Which variant is valid depends on the task kind.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskAttributes {
    Metadata(MetadataTask),
    Column(ConfigColumn),
    Folder(FolderTask),
    Connection(ExpectedConnection),
}

impl TaskAttributes {
    #[must_use]
    pub const fn accepts(&self, kind: TaskKind) -> bool {
        matches!(
            (self, kind),
            (Self::Metadata(_), TaskKind::AddMetadata)
                | (Self::Column(_), TaskKind::AddColumn | TaskKind::ModifyColumn)
                | (Self::Folder(_), TaskKind::AddFolder | TaskKind::DeleteFolder)
                | (Self::Connection(_), TaskKind::UpdateConnection)
        )
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Metadata(_) => "metadata",
            Self::Column(_) => "column",
            Self::Folder(_) => "folder",
            Self::Connection(_) => "connection",
        }
    }
}

/// One corrective action against one datasource.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    pub datasource_id: String,
    pub attributes: TaskAttributes,
    /// Live-side context recorded at planning time, for audit logging only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<serde_json::Value>,
}

impl Task {
    /// Build a task, rejecting a payload that does not belong to `kind`.
    pub fn new(
        kind: TaskKind,
        datasource_id: impl Into<String>,
        attributes: TaskAttributes,
    ) -> Result<Self, CoreError> {
        let task = Self {
            kind,
            datasource_id: datasource_id.into(),
            attributes,
            comparison: None,
        };
        task.validate()?;
        Ok(task)
    }

    #[must_use]
    pub fn with_comparison(mut self, comparison: serde_json::Value) -> Self {
        self.comparison = Some(comparison);
        self
    }

    /// Check that the payload matches the kind.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.attributes.accepts(self.kind) {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "task {} cannot carry {} attributes",
                self.kind,
                self.attributes.label()
            )))
        }
    }
}

/// All work planned for one datasource, grouped by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TaskSet {
    pub datasource_id: String,
    pub datasource_name: String,
    pub project: String,
    #[serde(default)]
    pub add_metadata: Vec<Task>,
    #[serde(default)]
    pub add_column: Vec<Task>,
    #[serde(default)]
    pub modify_column: Vec<Task>,
    #[serde(default)]
    pub add_folder: Vec<Task>,
    #[serde(default)]
    pub delete_folder: Vec<Task>,
    #[serde(default)]
    pub update_connection: Vec<Task>,
}

impl TaskSet {
    pub fn new(
        datasource_id: impl Into<String>,
        datasource_name: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            datasource_id: datasource_id.into(),
            datasource_name: datasource_name.into(),
            project: project.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tasks(&self, kind: TaskKind) -> &[Task] {
        match kind {
            TaskKind::AddMetadata => &self.add_metadata,
            TaskKind::AddColumn => &self.add_column,
            TaskKind::ModifyColumn => &self.modify_column,
            TaskKind::AddFolder => &self.add_folder,
            TaskKind::DeleteFolder => &self.delete_folder,
            TaskKind::UpdateConnection => &self.update_connection,
        }
    }

    fn tasks_mut(&mut self, kind: TaskKind) -> &mut Vec<Task> {
        match kind {
            TaskKind::AddMetadata => &mut self.add_metadata,
            TaskKind::AddColumn => &mut self.add_column,
            TaskKind::ModifyColumn => &mut self.modify_column,
            TaskKind::AddFolder => &mut self.add_folder,
            TaskKind::DeleteFolder => &mut self.delete_folder,
            TaskKind::UpdateConnection => &mut self.update_connection,
        }
    }

    /// Append a task to the list for its kind.
    pub fn push(&mut self, task: Task) -> Result<(), CoreError> {
        task.validate()?;
        if task.datasource_id != self.datasource_id {
            return Err(CoreError::Validation(format!(
                "task for datasource {} pushed into task set for {}",
                task.datasource_id, self.datasource_id
            )));
        }
        self.tasks_mut(task.kind).push(task);
        Ok(())
    }

    /// Check every task after a task set has been read back from transport.
    pub fn validate(&self) -> Result<(), CoreError> {
        for kind in TaskKind::ALL {
            for task in self.tasks(*kind) {
                if task.kind != *kind {
                    return Err(CoreError::Validation(format!(
                        "{} task filed under {kind}",
                        task.kind
                    )));
                }
                task.validate()?;
            }
        }
        Ok(())
    }

    /// `true` when all six lists are empty: the datasource has converged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        TaskKind::ALL.iter().all(|kind| self.tasks(*kind).is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        TaskKind::ALL.iter().map(|kind| self.tasks(*kind).len()).sum()
    }

    /// Tasks in application order.
    pub fn in_apply_order(&self) -> impl Iterator<Item = &Task> {
        TaskKind::APPLY_ORDER
            .iter()
            .flat_map(|kind| self.tasks(*kind).iter())
    }
}
