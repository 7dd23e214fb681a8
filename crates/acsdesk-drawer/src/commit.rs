//! Commit orchestration.
//!
//! A commit hands every `queued` task to the device transport as one batch
//! and turns the per-device reports into operator notifications as they
//! arrive. The transport owns status transitions; the orchestrator only
//! reads what it reports.

use std::sync::Arc;

use acsdesk_config::{QueuedTask, TaskStatus};
use acsdesk_notify::{NotificationKind, NotificationSink};
use acsdesk_store::{RefreshSignal, TaskStore};
use acsdesk_transport::{CONNECTION_REQUEST_OK, DeviceReport, DeviceTransport, report_channel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

/// How one device fared in a commit round.
///
/// Variants are listed in precedence order: a report is judged by the first
/// one that applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeviceVerdict {
  /// The device could not be handled at all.
  Failed { error: String },
  /// The connection request was not accepted.
  ConnectionRequest { status: String },
  /// At least one task went stale.
  NoContact,
  /// At least one task faulted.
  Faulted,
  Committed,
}

impl DeviceVerdict {
  pub fn evaluate(report: &DeviceReport) -> Self {
    if let Some(error) = &report.error {
      DeviceVerdict::Failed {
        error: error.clone(),
      }
    } else if report.connection_request_status != CONNECTION_REQUEST_OK {
      DeviceVerdict::ConnectionRequest {
        status: report.connection_request_status.clone(),
      }
    } else if report.has_task_with(TaskStatus::Stale) {
      DeviceVerdict::NoContact
    } else if report.has_task_with(TaskStatus::Fault) {
      DeviceVerdict::Faulted
    } else {
      DeviceVerdict::Committed
    }
  }

  pub fn kind(&self) -> NotificationKind {
    match self {
      DeviceVerdict::Committed => NotificationKind::Success,
      _ => NotificationKind::Error,
    }
  }

  /// Notification text for `device_id`.
  pub fn message(&self, device_id: &str) -> String {
    match self {
      DeviceVerdict::Failed { error } => format!("{device_id}: {error}"),
      DeviceVerdict::ConnectionRequest { status } => format!("{device_id}: {status}"),
      DeviceVerdict::NoContact => format!("{device_id}: No contact from device"),
      DeviceVerdict::Faulted => format!("{device_id}: Task(s) faulted"),
      DeviceVerdict::Committed => format!("{device_id}: Task(s) committed"),
    }
  }
}

/// Outcome of one device, in report arrival order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceOutcome {
  pub device_id: String,
  #[serde(flatten)]
  pub verdict: DeviceVerdict,
  pub message: String,
}

/// Result of a commit round.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitSummary {
  /// Number of tasks handed to the transport.
  pub submitted: usize,
  pub devices: Vec<DeviceOutcome>,
  /// Set when the transport rejected the whole batch.
  pub batch_error: Option<String>,
  /// Global timestamp written after a completed batch.
  pub refreshed_at: Option<DateTime<Utc>>,
}

impl CommitSummary {
  pub fn succeeded(&self) -> usize {
    self
      .devices
      .iter()
      .filter(|d| d.verdict == DeviceVerdict::Committed)
      .count()
  }

  pub fn failed(&self) -> usize {
    self.devices.len() - self.succeeded()
  }
}

/// Runs commit rounds against the injected collaborators.
pub struct CommitOrchestrator {
  store: Arc<dyn TaskStore>,
  transport: Arc<dyn DeviceTransport>,
  notifications: Arc<dyn NotificationSink>,
  refresh: Arc<dyn RefreshSignal>,
}

impl CommitOrchestrator {
  pub fn new(
    store: Arc<dyn TaskStore>,
    transport: Arc<dyn DeviceTransport>,
    notifications: Arc<dyn NotificationSink>,
    refresh: Arc<dyn RefreshSignal>,
  ) -> Self {
    Self {
      store,
      transport,
      notifications,
      refresh,
    }
  }

  /// Commit every `queued` task.
  ///
  /// Never fails: device and batch failures become notifications. The global
  /// timestamp is set once, after the last report, and only if the batch
  /// completed. With nothing queued this returns immediately.
  pub async fn commit(&self) -> CommitSummary {
    let tasks: Vec<QueuedTask> = self
      .store
      .queue()
      .into_iter()
      .filter(|t| t.status == TaskStatus::Queued)
      .collect();

    if tasks.is_empty() {
      debug!("nothing queued, skipping commit");
      return CommitSummary::default();
    }

    let submitted = tasks.len();
    info!(tasks = submitted, "commit_started");

    let (sender, mut stream) = report_channel();

    // The sender moves into the batch future; the stream ends when it is done
    let batch = self.transport.commit(tasks, sender);
    let drain = async {
      let mut devices = Vec::new();
      while let Some(report) = stream.next().await {
        devices.push(self.handle_report(&report));
      }
      devices
    };

    let (result, devices) = tokio::join!(batch, drain);

    let mut summary = CommitSummary {
      submitted,
      devices,
      ..CommitSummary::default()
    };

    match result {
      Ok(()) => {
        let now = Utc::now();
        self.refresh.set_timestamp(now);
        summary.refreshed_at = Some(now);
        info!(
          devices = summary.devices.len(),
          succeeded = summary.succeeded(),
          failed = summary.failed(),
          "commit_completed"
        );
      }
      Err(e) => {
        error!(error = %e, "commit_failed");
        let message = e.to_string();
        self
          .notifications
          .push(NotificationKind::Error, message.clone());
        summary.batch_error = Some(message);
      }
    }

    summary
  }

  fn handle_report(&self, report: &DeviceReport) -> DeviceOutcome {
    let verdict = DeviceVerdict::evaluate(report);
    let message = verdict.message(&report.device_id);

    debug!(
      device_id = %report.device_id,
      tasks = report.tasks.len(),
      verdict = ?verdict,
      "device_report"
    );
    self.notifications.push(verdict.kind(), message.clone());

    DeviceOutcome {
      device_id: report.device_id.clone(),
      verdict,
      message,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use acsdesk_config::TaskOperation;

  fn tasks(statuses: &[TaskStatus]) -> Vec<QueuedTask> {
    statuses
      .iter()
      .map(|s| QueuedTask::new(TaskOperation::Reboot, "dev1").with_status(*s))
      .collect()
  }

  #[test]
  fn test_error_wins_over_everything() {
    let mut report = DeviceReport::failed("dev1", "socket hang up");
    report.connection_request_status = "Device is offline".to_string();
    report.tasks = tasks(&[TaskStatus::Stale, TaskStatus::Fault]);

    let verdict = DeviceVerdict::evaluate(&report);
    assert_eq!(verdict.message("dev1"), "dev1: socket hang up");
    assert_eq!(verdict.kind(), NotificationKind::Error);
  }

  #[test]
  fn test_connection_request_status() {
    let report = DeviceReport::connection_request("dev1", "Device is offline");
    let verdict = DeviceVerdict::evaluate(&report);
    assert_eq!(verdict.message("dev1"), "dev1: Device is offline");
  }

  #[test]
  fn test_stale_beats_fault_regardless_of_order() {
    for order in [
      [TaskStatus::Fault, TaskStatus::Stale],
      [TaskStatus::Stale, TaskStatus::Fault],
    ] {
      let report = DeviceReport::ok("dev1", tasks(&order));
      assert_eq!(DeviceVerdict::evaluate(&report), DeviceVerdict::NoContact);
    }
    assert_eq!(
      DeviceVerdict::NoContact.message("dev1"),
      "dev1: No contact from device"
    );
  }

  #[test]
  fn test_fault_and_success() {
    let faulted = DeviceReport::ok("dev1", tasks(&[TaskStatus::Pending, TaskStatus::Fault]));
    assert_eq!(DeviceVerdict::evaluate(&faulted), DeviceVerdict::Faulted);
    assert_eq!(DeviceVerdict::Faulted.message("dev1"), "dev1: Task(s) faulted");

    let ok = DeviceReport::ok("dev1", tasks(&[TaskStatus::Pending]));
    let verdict = DeviceVerdict::evaluate(&ok);
    assert_eq!(verdict, DeviceVerdict::Committed);
    assert_eq!(verdict.kind(), NotificationKind::Success);
    assert_eq!(verdict.message("dev1"), "dev1: Task(s) committed");

    // No tasks reported is still a success
    assert_eq!(
      DeviceVerdict::evaluate(&DeviceReport::ok("dev1", vec![])),
      DeviceVerdict::Committed
    );
  }

  #[test]
  fn test_outcome_serializes_flat() {
    let outcome = DeviceOutcome {
      device_id: "dev1".to_string(),
      verdict: DeviceVerdict::Failed {
        error: "timeout".to_string(),
      },
      message: "dev1: timeout".to_string(),
    };
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["outcome"], "failed");
    assert_eq!(value["error"], "timeout");
    assert_eq!(value["device_id"], "dev1");
  }
}
