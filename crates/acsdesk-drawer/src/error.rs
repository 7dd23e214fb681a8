//! Drawer errors.

use acsdesk_config::{TaskId, TaskStatus};
use acsdesk_store::StoreError;

/// Errors from operator actions on the drawer.
///
/// Commit outcomes are never errors; they become notifications.
#[derive(Debug, thiserror::Error)]
pub enum DrawerError {
  /// No staged task with this id.
  #[error("staged task '{task_id}' not found")]
  StagedNotFound { task_id: TaskId },

  /// No queued task with this id.
  #[error("queued task '{task_id}' not found")]
  TaskNotFound { task_id: TaskId },

  /// The staged task is not well-formed enough to queue.
  #[error("staged task '{task_id}' cannot be queued: {reason}")]
  NotQueueable { task_id: TaskId, reason: String },

  /// Only faulted and stale tasks can be retried.
  #[error("task '{task_id}' is {status} and cannot be retried")]
  NotRetryable { task_id: TaskId, status: TaskStatus },

  /// The edit does not apply to this kind of task.
  #[error("task '{task_id}' is a {actual} task, expected {expected}")]
  WrongOperation {
    task_id: TaskId,
    expected: &'static str,
    actual: &'static str,
  },

  /// The selection control is disabled while the file catalog loads.
  #[error("file catalog is still loading")]
  CatalogLoading,

  /// Task store failure.
  #[error(transparent)]
  Store(#[from] StoreError),
}
