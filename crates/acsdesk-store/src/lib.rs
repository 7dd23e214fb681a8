//! acsdesk Store
//!
//! This crate provides the process-wide collaborators the task drawer reads
//! and writes:
//! - [`TaskStore`]: the staging and queue collections
//! - [`FileCatalog`]: file records offered for download tasks
//! - [`RefreshSignal`]: the "last refreshed" timestamp other views watch
//!
//! Each contract ships with an in-memory implementation. Services are
//! constructed once per process and injected, so the drawer can be tested
//! against fakes.

mod catalog;
mod memory;
mod refresh;

pub use catalog::{FileCatalog, InMemoryFileCatalog};
pub use memory::InMemoryTaskStore;
pub use refresh::{RefreshSignal, WatchRefreshSignal};

use acsdesk_config::{QueuedTask, StagedTask, TaskId, TaskStatus};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// No queued task with this id.
  #[error("queued task not found: {0}")]
  TaskNotFound(TaskId),

  /// No staged task with this id.
  #[error("staged task not found: {0}")]
  StagedNotFound(TaskId),
}

/// Storage contract for staged and queued tasks.
///
/// All operations are synchronous with the operator action that triggers
/// them. Collections preserve insertion order.
pub trait TaskStore: Send + Sync {
  /// All queued tasks, in enqueue order.
  fn queue(&self) -> Vec<QueuedTask>;

  /// All staged tasks, in staging order.
  fn staging(&self) -> Vec<StagedTask>;

  /// Get a staged task by id.
  fn staged(&self, id: &TaskId) -> Option<StagedTask>;

  /// Add a staged task.
  fn stage(&self, task: StagedTask);

  /// Replace a staged task with an edited copy.
  fn update_staged(&self, task: StagedTask) -> Result<(), StoreError>;

  /// Remove a staged task, returning it if it was present.
  fn unstage(&self, id: &TaskId) -> Option<StagedTask>;

  /// Enqueue a task with status `queued`.
  ///
  /// Enqueueing a task that is already in the queue resets its status and
  /// keeps its position.
  fn queue_task(&self, task: QueuedTask);

  /// Remove a queued task.
  fn delete_task(&self, id: &TaskId) -> Result<(), StoreError>;

  /// Record a status transition reported by the device transport.
  fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), StoreError>;

  /// Remove all queued tasks.
  fn clear(&self);
}
