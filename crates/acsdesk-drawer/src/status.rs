//! Queue status aggregation.

use acsdesk_config::{QueuedTask, TaskStatus};
use indexmap::IndexMap;
use serde::Serialize;

/// Per-status task counts, recomputed on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
  pub queued: usize,
  pub pending: usize,
  pub fault: usize,
  pub stale: usize,
}

impl StatusCounts {
  /// Count tasks by status in one pass.
  pub fn summarize(queue: &[QueuedTask]) -> Self {
    queue.iter().fold(Self::default(), |mut counts, task| {
      *counts.slot(task.status) += 1;
      counts
    })
  }

  pub fn get(&self, status: TaskStatus) -> usize {
    match status {
      TaskStatus::Queued => self.queued,
      TaskStatus::Pending => self.pending,
      TaskStatus::Fault => self.fault,
      TaskStatus::Stale => self.stale,
    }
  }

  pub fn total(&self) -> usize {
    self.queued + self.pending + self.fault + self.stale
  }

  fn slot(&mut self, status: TaskStatus) -> &mut usize {
    match status {
      TaskStatus::Queued => &mut self.queued,
      TaskStatus::Pending => &mut self.pending,
      TaskStatus::Fault => &mut self.fault,
      TaskStatus::Stale => &mut self.stale,
    }
  }
}

/// Group queued tasks by device.
///
/// Devices appear in the order they were first seen; tasks keep their
/// enqueue order within a device.
pub fn group_by_device(queue: &[QueuedTask]) -> IndexMap<String, Vec<QueuedTask>> {
  let mut groups: IndexMap<String, Vec<QueuedTask>> = IndexMap::new();
  for task in queue {
    groups
      .entry(task.device.clone())
      .or_default()
      .push(task.clone());
  }
  groups
}

/// Operator action offered next to a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueAction {
  Retry,
  Remove,
}

/// Actions available for a task: retry only once it faulted or went stale.
pub fn actions_for(task: &QueuedTask) -> Vec<QueueAction> {
  if task.status.is_retryable() {
    vec![QueueAction::Retry, QueueAction::Remove]
  } else {
    vec![QueueAction::Remove]
  }
}

/// One line of the queue list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
  pub task: QueuedTask,
  pub description: String,
  pub actions: Vec<QueueAction>,
}

impl From<&QueuedTask> for QueueEntry {
  fn from(task: &QueuedTask) -> Self {
    Self {
      description: task.operation.to_string(),
      actions: actions_for(task),
      task: task.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use acsdesk_config::TaskOperation;

  fn task(device: &str, status: TaskStatus) -> QueuedTask {
    QueuedTask::new(TaskOperation::Reboot, device).with_status(status)
  }

  #[test]
  fn test_counts_sum_to_queue_length() {
    let queue = vec![
      task("d1", TaskStatus::Queued),
      task("d1", TaskStatus::Fault),
      task("d2", TaskStatus::Stale),
      task("d3", TaskStatus::Pending),
      task("d3", TaskStatus::Queued),
    ];

    let counts = StatusCounts::summarize(&queue);
    assert_eq!(counts.queued, 2);
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.fault, 1);
    assert_eq!(counts.stale, 1);
    assert_eq!(counts.total(), queue.len());
    for status in TaskStatus::ALL {
      assert_eq!(
        counts.get(status),
        queue.iter().filter(|t| t.status == status).count()
      );
    }
  }

  #[test]
  fn test_empty_queue() {
    assert_eq!(StatusCounts::summarize(&[]), StatusCounts::default());
    assert!(group_by_device(&[]).is_empty());
  }

  #[test]
  fn test_group_preserves_order() {
    let queue = vec![
      task("d2", TaskStatus::Queued),
      task("d1", TaskStatus::Queued),
      task("d2", TaskStatus::Fault),
    ];

    let groups = group_by_device(&queue);
    let devices: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(devices, vec!["d2", "d1"]);
    assert_eq!(groups["d2"][0].id, queue[0].id);
    assert_eq!(groups["d2"][1].id, queue[2].id);
  }

  #[test]
  fn test_retry_offered_for_fault_and_stale_only() {
    assert_eq!(
      actions_for(&task("d1", TaskStatus::Fault)),
      vec![QueueAction::Retry, QueueAction::Remove]
    );
    assert_eq!(
      actions_for(&task("d1", TaskStatus::Stale)),
      vec![QueueAction::Retry, QueueAction::Remove]
    );
    assert_eq!(actions_for(&task("d1", TaskStatus::Queued)), vec![QueueAction::Remove]);
    assert_eq!(actions_for(&task("d1", TaskStatus::Pending)), vec![QueueAction::Remove]);
  }

  #[test]
  fn test_queue_entry_description() {
    let entry = QueueEntry::from(&task("d1", TaskStatus::Queued));
    assert_eq!(entry.description, "Reboot");
    assert_eq!(entry.actions, vec![QueueAction::Remove]);
  }
}
