use serde::{Deserialize, Serialize};

/// Lifecycle status of a queued device task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  /// Accepted locally, not yet committed.
  #[default]
  Queued,
  /// In flight to the device.
  Pending,
  /// The device reported a protocol-level failure.
  Fault,
  /// The device did not respond.
  Stale,
}

impl TaskStatus {
  pub const ALL: [TaskStatus; 4] = [
    TaskStatus::Queued,
    TaskStatus::Pending,
    TaskStatus::Fault,
    TaskStatus::Stale,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      TaskStatus::Queued => "queued",
      TaskStatus::Pending => "pending",
      TaskStatus::Fault => "fault",
      TaskStatus::Stale => "stale",
    }
  }

  /// Faulted and stale tasks can be re-submitted by the operator.
  pub fn is_retryable(&self) -> bool {
    matches!(self, TaskStatus::Fault | TaskStatus::Stale)
  }
}

impl std::fmt::Display for TaskStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
