//! # tds-core
//!
//! Plain-data types shared by every tdsync crate.
//!
//! This crate provides:
//! - Desired-state declarations (`ConfigDatasource`, `ConfigColumn`, `ConfigFolder`)
//! - Expected connection attributes and publish credentials
//! - Tasks and per-datasource task sets handed from planning to application
//! - Column attribute enums (datatype, role, role type, persona)
//! - The cross-cutting error taxonomy
//!
//! Nothing in here holds a live handle: every type round-trips through JSON so
//! a task set can cross a process or pipeline-stage boundary.

pub mod desired;
pub mod enums;
pub mod errors;
pub mod names;
pub mod tasks;

pub use desired::{
    ConfigColumn, ConfigDatasource, ConfigFolder, ConnectionCredentials, ExpectedConnection,
};
pub use enums::{ConnectionField, DataType, Persona, Role, RoleType, TaskKind};
pub use errors::CoreError;
pub use tasks::{FolderTask, MetadataSpec, MetadataTask, Task, TaskAttributes, TaskSet};
