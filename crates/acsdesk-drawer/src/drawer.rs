//! The task drawer: operator actions over staging and the queue.

use std::sync::{Arc, Mutex};

use acsdesk_config::{ConsoleConfig, QueuedTask, StagedTask, TaskId};
use acsdesk_notify::{Notification, NotificationSink};
use acsdesk_store::{FileCatalog, RefreshSignal, TaskStore};
use acsdesk_transport::DeviceTransport;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::commit::{CommitOrchestrator, CommitSummary};
use crate::download::{self, DownloadChoices};
use crate::error::DrawerError;
use crate::staging;
use crate::status::{QueueEntry, StatusCounts, group_by_device};
use crate::validity::{ValidityTracker, invalid_reason};

/// Process-wide collaborators the drawer is wired to.
#[derive(Clone)]
pub struct DrawerServices {
  pub store: Arc<dyn TaskStore>,
  pub catalog: Arc<dyn FileCatalog>,
  pub transport: Arc<dyn DeviceTransport>,
  pub notifications: Arc<dyn NotificationSink>,
  pub refresh: Arc<dyn RefreshSignal>,
}

/// A staged task as listed in the drawer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedEntry {
  pub task: StagedTask,
  pub queueable: bool,
  /// Why the task cannot be queued yet.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<&'static str>,
}

pub struct Drawer {
  store: Arc<dyn TaskStore>,
  catalog: Arc<dyn FileCatalog>,
  notifications: Arc<dyn NotificationSink>,
  orchestrator: CommitOrchestrator,
  validity: Mutex<ValidityTracker>,
  config: ConsoleConfig,
}

impl Drawer {
  pub fn new(services: DrawerServices, config: ConsoleConfig) -> Self {
    let orchestrator = CommitOrchestrator::new(
      services.store.clone(),
      services.transport,
      services.notifications.clone(),
      services.refresh,
    );

    Self {
      store: services.store,
      catalog: services.catalog,
      notifications: services.notifications,
      orchestrator,
      validity: Mutex::new(ValidityTracker::new()),
      config,
    }
  }

  pub fn config(&self) -> &ConsoleConfig {
    &self.config
  }

  // Staging

  /// Add a staged edit and return its id.
  pub fn stage(&self, task: StagedTask) -> TaskId {
    let id = task.id.clone();
    self.validity.lock().unwrap().observe(&task);
    self.store.stage(task);
    id
  }

  /// Apply an edit to a staged task and re-evaluate its validity.
  ///
  /// Returns whether the task is queueable afterwards.
  pub fn edit_staged<F>(&self, id: &TaskId, edit: F) -> Result<bool, DrawerError>
  where
    F: FnOnce(&mut StagedTask) -> Result<(), DrawerError>,
  {
    let mut task = self.staged(id)?;
    edit(&mut task)?;
    let valid = self.validity.lock().unwrap().observe(&task);
    self.store.update_staged(task)?;
    Ok(valid)
  }

  /// List staged tasks with their validity.
  ///
  /// Every task is re-evaluated; entries of tasks that left staging are
  /// pruned.
  pub fn staging_view(&self) -> Vec<StagedEntry> {
    let staging = self.store.staging();
    let mut validity = self.validity.lock().unwrap();
    validity.retain_live(staging.iter().map(|t| &t.id));

    staging
      .into_iter()
      .map(|task| StagedEntry {
        queueable: validity.observe(&task),
        reason: invalid_reason(&task),
        task,
      })
      .collect()
  }

  /// Queueability as last observed; `None` for tasks not in staging.
  pub fn is_queueable(&self, id: &TaskId) -> Option<bool> {
    self.validity.lock().unwrap().is_queueable(id)
  }

  /// Queue a staged task: one queued task per target device.
  ///
  /// The staged task leaves staging. Returns the ids of the queued tasks in
  /// device order.
  pub fn queue_staged(&self, id: &TaskId) -> Result<Vec<TaskId>, DrawerError> {
    let task = self.staged(id)?;

    if !self.validity.lock().unwrap().observe(&task) {
      let reason = invalid_reason(&task).unwrap_or("invalid");
      return Err(DrawerError::NotQueueable {
        task_id: id.clone(),
        reason: reason.to_string(),
      });
    }

    let queued = staging::split(&task);
    let ids: Vec<TaskId> = queued.iter().map(|t| t.id.clone()).collect();
    for task in queued {
      self.store.queue_task(task);
    }

    self.store.unstage(id);
    self.validity.lock().unwrap().forget(id);

    info!(
      task_id = %id,
      name = task.operation.name(),
      devices = ids.len(),
      "staged_task_queued"
    );
    Ok(ids)
  }

  /// Discard a staged task without queueing anything.
  pub fn cancel_staged(&self, id: &TaskId) -> Result<StagedTask, DrawerError> {
    let task = self
      .store
      .unstage(id)
      .ok_or_else(|| DrawerError::StagedNotFound {
        task_id: id.clone(),
      })?;
    self.validity.lock().unwrap().forget(id);
    debug!(task_id = %id, "staged_task_cancelled");
    Ok(task)
  }

  /// Store operator input as the value of a setParameterValues edit.
  pub fn set_parameter_input(&self, id: &TaskId, input: &str) -> Result<bool, DrawerError> {
    self.edit_staged(id, |task| {
      if staging::set_parameter_input(task, input) {
        Ok(())
      } else {
        Err(DrawerError::WrongOperation {
          task_id: task.id.clone(),
          expected: "setParameterValues",
          actual: task.operation.name(),
        })
      }
    })
  }

  // Download edits

  pub fn download_choices(&self, id: &TaskId) -> Result<DownloadChoices, DrawerError> {
    let task = self.staged(id)?;
    Ok(DownloadChoices::build(
      &task,
      self.catalog.as_ref(),
      &self.config,
    ))
  }

  pub fn select_file(&self, id: &TaskId, file_id: &str) -> Result<bool, DrawerError> {
    self.edit_staged(id, |task| {
      download::select_file(task, file_id, self.catalog.as_ref())
    })
  }

  pub fn select_file_type(&self, id: &TaskId, file_type: &str) -> Result<bool, DrawerError> {
    self.edit_staged(id, |task| download::select_file_type(task, file_type))
  }

  // Queue

  pub fn queue(&self) -> Vec<QueuedTask> {
    self.store.queue()
  }

  /// Re-submit a faulted or stale task with status `queued`.
  pub fn retry(&self, id: &TaskId) -> Result<(), DrawerError> {
    let task = self
      .store
      .queue()
      .into_iter()
      .find(|t| &t.id == id)
      .ok_or_else(|| DrawerError::TaskNotFound {
        task_id: id.clone(),
      })?;

    if !task.status.is_retryable() {
      return Err(DrawerError::NotRetryable {
        task_id: id.clone(),
        status: task.status,
      });
    }

    info!(task_id = %id, device = %task.device, previous = %task.status, "task_retried");
    self.store.queue_task(task);
    Ok(())
  }

  pub fn remove(&self, id: &TaskId) -> Result<(), DrawerError> {
    self
      .store
      .delete_task(id)
      .map_err(|_| DrawerError::TaskNotFound {
        task_id: id.clone(),
      })?;
    debug!(task_id = %id, "task_removed");
    Ok(())
  }

  pub fn clear(&self) {
    self.store.clear();
    debug!("queue_cleared");
  }

  pub fn summary(&self) -> StatusCounts {
    StatusCounts::summarize(&self.store.queue())
  }

  pub fn groups(&self) -> IndexMap<String, Vec<QueueEntry>> {
    group_by_device(&self.store.queue())
      .into_iter()
      .map(|(device, tasks)| (device, tasks.iter().map(QueueEntry::from).collect()))
      .collect()
  }

  pub fn can_commit(&self) -> bool {
    self.summary().queued > 0
  }

  pub fn can_clear(&self) -> bool {
    !self.store.queue().is_empty()
  }

  /// The drawer is shown while anything is staged or queued.
  pub fn is_open(&self) -> bool {
    !self.store.staging().is_empty() || !self.store.queue().is_empty()
  }

  /// Commit every queued task. See [`CommitOrchestrator::commit`].
  pub async fn commit(&self) -> CommitSummary {
    self.orchestrator.commit().await
  }

  pub fn notifications(&self) -> Vec<Notification> {
    self.notifications.notifications()
  }

  fn staged(&self, id: &TaskId) -> Result<StagedTask, DrawerError> {
    self.store.staged(id).ok_or_else(|| DrawerError::StagedNotFound {
      task_id: id.clone(),
    })
  }
}
