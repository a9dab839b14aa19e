//! # tds-sync
//!
//! Convergence engine for datasource artifacts.
//!
//! This crate provides:
//! - [`planner`]: compare desired datasources against live documents and
//!   produce a [`TaskSet`](tds_core::TaskSet) per datasource
//! - [`applier`]: apply a task set to a document in dependency order and
//!   serialize the result
//! - [`RunCoordinator`]: resolve, plan, apply, publish and refresh many
//!   datasources on a bounded worker pool with per-datasource failure isolation
//! - The collaborator seams ([`DatasourceProvider`], [`DesiredStateSource`],
//!   [`ConnectionResolver`]) and a directory-backed platform
//!   ([`DirectoryProvider`])
//!
//! Planning and application are independent entry points: a task set can be
//! written out after planning and applied later, in another process.

pub mod applier;
pub mod coordinator;
pub mod error;
pub mod local;
pub mod planner;
pub mod provider;

pub use applier::{apply, apply_tasks};
pub use coordinator::{RunCoordinator, RunOptions, RunReport};
pub use error::{DUPLICATE_REFRESH_MESSAGE, DatasourceFailure, ProviderError, SyncError};
pub use local::{DirectoryProvider, RefreshRequest};
pub use planner::{plan, plan_all};
pub use provider::{ConnectionResolver, DatasourceProvider, DatasourceRef, DesiredStateSource};
