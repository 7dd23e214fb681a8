//! A transport that plays back scripted device outcomes.
//!
//! Used by the CLI for dry runs and by tests as the device communication fake.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use acsdesk_config::{QueuedTask, TaskStatus};
use acsdesk_store::TaskStore;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::report::{DeviceReport, ReportSender};
use crate::{CONNECTION_REQUEST_OK, DeviceTransport, TransportError};

/// How a scripted device responds to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceScript {
  /// Communication error reported instead of contacting the device.
  pub error: Option<String>,
  /// Connection request result; anything but `"OK"` means not reached.
  pub connection_request_status: String,
  /// Status recorded on every task of the device after contact.
  /// `None` means the tasks were applied and leave the queue.
  pub task_status: Option<TaskStatus>,
  /// Delay before the device answers.
  pub delay_ms: u64,
}

impl Default for DeviceScript {
  fn default() -> Self {
    Self {
      error: None,
      connection_request_status: CONNECTION_REQUEST_OK.to_string(),
      task_status: None,
      delay_ms: 0,
    }
  }
}

impl DeviceScript {
  pub fn committed() -> Self {
    Self::default()
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      error: Some(message.into()),
      ..Self::default()
    }
  }

  pub fn connection_request(status: impl Into<String>) -> Self {
    Self {
      connection_request_status: status.into(),
      ..Self::default()
    }
  }

  pub fn task_status(status: TaskStatus) -> Self {
    Self {
      task_status: Some(status),
      ..Self::default()
    }
  }

  pub fn delayed(mut self, delay: Duration) -> Self {
    self.delay_ms = delay.as_millis() as u64;
    self
  }
}

/// Plays back [`DeviceScript`]s, recording status transitions in the store.
///
/// Devices without a script commit successfully. Devices are attempted
/// concurrently, so reports arrive in order of their delays.
pub struct ScriptedTransport {
  store: Arc<dyn TaskStore>,
  scripts: HashMap<String, DeviceScript>,
  reject: Option<String>,
}

impl ScriptedTransport {
  pub fn new(store: Arc<dyn TaskStore>) -> Self {
    Self {
      store,
      scripts: HashMap::new(),
      reject: None,
    }
  }

  /// Script the response of one device.
  pub fn with_device(mut self, device_id: impl Into<String>, script: DeviceScript) -> Self {
    self.scripts.insert(device_id.into(), script);
    self
  }

  pub fn with_devices(mut self, scripts: HashMap<String, DeviceScript>) -> Self {
    self.scripts.extend(scripts);
    self
  }

  /// Reject every batch with `message`, before any device is attempted.
  pub fn rejecting(mut self, message: impl Into<String>) -> Self {
    self.reject = Some(message.into());
    self
  }

  async fn attempt(&self, device_id: String, tasks: Vec<QueuedTask>, reports: &ReportSender) {
    let script = self.scripts.get(&device_id).cloned().unwrap_or_default();
    if script.delay_ms > 0 {
      tokio::time::sleep(Duration::from_millis(script.delay_ms)).await;
    }

    let report = if let Some(error) = script.error {
      self.record(&tasks, TaskStatus::Stale);
      DeviceReport::failed(&device_id, error)
    } else if script.connection_request_status != CONNECTION_REQUEST_OK {
      self.record(&tasks, TaskStatus::Stale);
      DeviceReport::connection_request(&device_id, script.connection_request_status)
    } else {
      let updated = match script.task_status {
        Some(status) => {
          self.record(&tasks, status);
          tasks.into_iter().map(|t| t.with_status(status)).collect()
        }
        None => {
          for task in &tasks {
            // Applied tasks leave the queue; a concurrent removal is fine
            let _ = self.store.delete_task(&task.id);
          }
          tasks
        }
      };
      DeviceReport::ok(&device_id, updated)
    };

    debug!(device_id = %device_id, "device attempted");
    reports.send(report);
  }

  fn record(&self, tasks: &[QueuedTask], status: TaskStatus) {
    for task in tasks {
      if let Err(e) = self.store.set_status(&task.id, status) {
        warn!(task_id = %task.id, error = %e, "task left the queue during commit");
      }
    }
  }
}

#[async_trait]
impl DeviceTransport for ScriptedTransport {
  async fn commit(
    &self,
    tasks: Vec<QueuedTask>,
    reports: ReportSender,
  ) -> Result<(), TransportError> {
    if let Some(message) = &self.reject {
      return Err(TransportError::Rejected {
        message: message.clone(),
      });
    }

    let mut devices: IndexMap<String, Vec<QueuedTask>> = IndexMap::new();
    for task in tasks {
      devices.entry(task.device.clone()).or_default().push(task);
    }

    info!(devices = devices.len(), "committing to devices");

    // Everything is in flight before the first device answers
    for task in devices.values().flatten() {
      if let Err(e) = self.store.set_status(&task.id, TaskStatus::Pending) {
        warn!(task_id = %task.id, error = %e, "task left the queue before commit");
      }
    }

    let attempts = devices.into_iter().map(|(device_id, mut tasks)| {
      for task in &mut tasks {
        task.status = TaskStatus::Pending;
      }
      self.attempt(device_id, tasks, &reports)
    });
    futures::future::join_all(attempts).await;

    Ok(())
  }
}
