//! Queueability of staged tasks.
//!
//! The flag lives in a side table keyed by task id so the task itself (and
//! its serialization and equality) never carries UI state. The table never
//! owns a task: entries for tasks that left staging are pruned.

use std::collections::{HashMap, HashSet};

use acsdesk_config::{StagedTask, TaskId, TaskOperation};

/// Why a staged task cannot be queued, or `None` if it can.
pub fn invalid_reason(task: &StagedTask) -> Option<&'static str> {
  match &task.operation {
    TaskOperation::Download {
      file_name,
      file_type,
    } => {
      if file_name.is_empty() {
        Some("no file selected")
      } else if file_type.is_empty() {
        Some("no file type selected")
      } else {
        None
      }
    }
    _ => None,
  }
}

/// Pure validity predicate.
pub fn is_valid(task: &StagedTask) -> bool {
  invalid_reason(task).is_none()
}

/// Tracks the queueability of staged tasks as last observed.
#[derive(Debug, Default)]
pub struct ValidityTracker {
  flags: HashMap<TaskId, bool>,
}

impl ValidityTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Re-evaluate a task and record the result. Returns whether it is valid.
  pub fn observe(&mut self, task: &StagedTask) -> bool {
    let valid = is_valid(task);
    self.flags.insert(task.id.clone(), valid);
    valid
  }

  /// Whether the task was queueable when last observed.
  ///
  /// `None` if the task was never observed or has left staging.
  pub fn is_queueable(&self, id: &TaskId) -> Option<bool> {
    self.flags.get(id).copied()
  }

  /// Drop the entry of a task that left staging.
  pub fn forget(&mut self, id: &TaskId) {
    self.flags.remove(id);
  }

  /// Drop entries for every task not in `live`.
  pub fn retain_live<'a>(&mut self, live: impl IntoIterator<Item = &'a TaskId>) {
    let live: HashSet<&TaskId> = live.into_iter().collect();
    self.flags.retain(|id, _| live.contains(id));
  }

  pub fn len(&self) -> usize {
    self.flags.len()
  }

  pub fn is_empty(&self) -> bool {
    self.flags.is_empty()
  }
}
