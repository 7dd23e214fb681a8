use std::sync::Mutex;

use acsdesk_config::{QueuedTask, StagedTask, TaskId, TaskStatus};
use indexmap::IndexMap;
use tracing::debug;

use crate::{StoreError, TaskStore};

#[derive(Debug, Default)]
struct Collections {
  staging: IndexMap<TaskId, StagedTask>,
  queue: IndexMap<TaskId, QueuedTask>,
}

/// In-memory task store.
///
/// Suitable for a single console session or testing.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
  inner: Mutex<Collections>,
}

impl InMemoryTaskStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl TaskStore for InMemoryTaskStore {
  fn queue(&self) -> Vec<QueuedTask> {
    let inner = self.inner.lock().unwrap();
    inner.queue.values().cloned().collect()
  }

  fn staging(&self) -> Vec<StagedTask> {
    let inner = self.inner.lock().unwrap();
    inner.staging.values().cloned().collect()
  }

  fn staged(&self, id: &TaskId) -> Option<StagedTask> {
    let inner = self.inner.lock().unwrap();
    inner.staging.get(id).cloned()
  }

  fn stage(&self, task: StagedTask) {
    let mut inner = self.inner.lock().unwrap();
    debug!(task_id = %task.id, name = task.operation.name(), "task_staged");
    inner.staging.insert(task.id.clone(), task);
  }

  fn update_staged(&self, task: StagedTask) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    match inner.staging.get_mut(&task.id) {
      Some(slot) => {
        *slot = task;
        Ok(())
      }
      None => Err(StoreError::StagedNotFound(task.id)),
    }
  }

  fn unstage(&self, id: &TaskId) -> Option<StagedTask> {
    let mut inner = self.inner.lock().unwrap();
    inner.staging.shift_remove(id)
  }

  fn queue_task(&self, mut task: QueuedTask) {
    task.status = TaskStatus::Queued;
    let mut inner = self.inner.lock().unwrap();
    debug!(task_id = %task.id, device = %task.device, "task_queued");
    inner.queue.insert(task.id.clone(), task);
  }

  fn delete_task(&self, id: &TaskId) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    inner
      .queue
      .shift_remove(id)
      .map(|_| ())
      .ok_or_else(|| StoreError::TaskNotFound(id.clone()))
  }

  fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), StoreError> {
    let mut inner = self.inner.lock().unwrap();
    let task = inner
      .queue
      .get_mut(id)
      .ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
    task.status = status;
    Ok(())
  }

  fn clear(&self) {
    let mut inner = self.inner.lock().unwrap();
    inner.queue.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use acsdesk_config::TaskOperation;

  #[test]
  fn test_queue_preserves_order_and_resets_status() {
    let store = InMemoryTaskStore::new();
    let a = QueuedTask::new(TaskOperation::Reboot, "dev1");
    let b = QueuedTask::new(TaskOperation::FactoryReset, "dev2");

    store.queue_task(a.clone());
    store.queue_task(b.clone());
    store.set_status(&a.id, TaskStatus::Fault).unwrap();

    // Retry re-enqueues in place
    store.queue_task(store.queue()[0].clone());

    let queue = store.queue();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].id, a.id);
    assert_eq!(queue[0].status, TaskStatus::Queued);
    assert_eq!(queue[1].id, b.id);
  }

  #[test]
  fn test_queue_task_forces_queued_status() {
    let store = InMemoryTaskStore::new();
    store.queue_task(QueuedTask::new(TaskOperation::Reboot, "dev1").with_status(TaskStatus::Stale));
    assert_eq!(store.queue()[0].status, TaskStatus::Queued);
  }

  #[test]
  fn test_delete_and_clear() {
    let store = InMemoryTaskStore::new();
    let a = QueuedTask::new(TaskOperation::Reboot, "dev1");
    store.queue_task(a.clone());
    store.queue_task(QueuedTask::new(TaskOperation::Reboot, "dev2"));

    store.delete_task(&a.id).unwrap();
    assert_eq!(store.queue().len(), 1);
    assert!(matches!(
      store.delete_task(&a.id),
      Err(StoreError::TaskNotFound(_))
    ));

    store.clear();
    assert!(store.queue().is_empty());
  }

  #[test]
  fn test_staging_lifecycle() {
    let store = InMemoryTaskStore::new();
    let mut task = StagedTask::new(TaskOperation::download(), ["dev1"]);
    store.stage(task.clone());

    task.operation = TaskOperation::Download {
      file_name: "fw.bin".to_string(),
      file_type: "1 Firmware Upgrade Image".to_string(),
    };
    store.update_staged(task.clone()).unwrap();
    assert_eq!(store.staged(&task.id), Some(task.clone()));

    assert_eq!(store.unstage(&task.id), Some(task.clone()));
    assert!(store.staging().is_empty());
    assert!(matches!(
      store.update_staged(task),
      Err(StoreError::StagedNotFound(_))
    ));
  }
}
