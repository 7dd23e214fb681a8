//! acsdesk Transport
//!
//! The device communication contract consumed by the commit orchestrator.
//!
//! A transport receives a batch of queued tasks, groups them by device,
//! attempts each device and emits exactly one [`DeviceReport`] per device on
//! a [`ReportStream`]. The commit future resolves once every device has been
//! attempted, or rejects as a whole on a transport-level failure.
//!
//! There is no cancellation: once a commit is issued, every device outcome is
//! awaited.

mod report;
mod scripted;

pub use report::{DeviceReport, ReportSender, ReportStream, report_channel};
pub use scripted::{DeviceScript, ScriptedTransport};

use acsdesk_config::QueuedTask;
use async_trait::async_trait;

/// Connection request status reported when the device was reached.
pub const CONNECTION_REQUEST_OK: &str = "OK";

/// Transport-level failures that reject a whole commit batch.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
  /// The management server refused the batch.
  #[error("{message}")]
  Rejected { message: String },

  /// The management server could not be reached.
  #[error("connection failed: {message}")]
  Connection { message: String },
}

/// Performs the per-device commit.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
  /// Commit `tasks`, sending one report per device to `reports`.
  ///
  /// Returns when every device has been attempted.
  async fn commit(&self, tasks: Vec<QueuedTask>, reports: ReportSender)
  -> Result<(), TransportError>;
}
