use acsdesk_config::{QueuedTask, TaskStatus};
use tokio::sync::mpsc;

use crate::CONNECTION_REQUEST_OK;

/// Outcome of committing to one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
  pub device_id: String,
  /// Communication failure, if the device could not be handled at all.
  pub error: Option<String>,
  /// Result of the connection request, `"OK"` when the device was reached.
  pub connection_request_status: String,
  /// The device's tasks as last recorded by the store.
  pub tasks: Vec<QueuedTask>,
}

impl DeviceReport {
  /// A report for a device that was reached.
  pub fn ok(device_id: impl Into<String>, tasks: Vec<QueuedTask>) -> Self {
    Self {
      device_id: device_id.into(),
      error: None,
      connection_request_status: CONNECTION_REQUEST_OK.to_string(),
      tasks,
    }
  }

  /// A report for a device that failed with a communication error.
  pub fn failed(device_id: impl Into<String>, error: impl Into<String>) -> Self {
    Self {
      device_id: device_id.into(),
      error: Some(error.into()),
      connection_request_status: String::new(),
      tasks: Vec::new(),
    }
  }

  /// A report for a device whose connection request was not accepted.
  pub fn connection_request(device_id: impl Into<String>, status: impl Into<String>) -> Self {
    Self {
      device_id: device_id.into(),
      error: None,
      connection_request_status: status.into(),
      tasks: Vec::new(),
    }
  }

  pub fn has_task_with(&self, status: TaskStatus) -> bool {
    self.tasks.iter().any(|t| t.status == status)
  }
}

/// Create a connected report sender and stream.
pub fn report_channel() -> (ReportSender, ReportStream) {
  let (sender, receiver) = mpsc::unbounded_channel();
  (ReportSender { sender }, ReportStream { receiver })
}

/// Sending half handed to the transport.
///
/// The stream ends once every sender clone is dropped, which happens when the
/// transport's commit future completes.
#[derive(Debug, Clone)]
pub struct ReportSender {
  // Unbounded so a device report never waits on the orchestrator; at most
  // one report per device is sent per commit.
  sender: mpsc::UnboundedSender<DeviceReport>,
}

impl ReportSender {
  pub fn send(&self, report: DeviceReport) {
    // Ignore send errors - the stream may have been dropped
    let _ = self.sender.send(report);
  }
}

/// Per-device reports in arrival order.
#[derive(Debug)]
pub struct ReportStream {
  receiver: mpsc::UnboundedReceiver<DeviceReport>,
}

impl ReportStream {
  /// Next report, or `None` once the transport has finished sending.
  pub async fn next(&mut self) -> Option<DeviceReport> {
    self.receiver.recv().await
  }
}
