use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default time a dismissed notification stays visible before removal.
pub const DEFAULT_GRACE_MS: u64 = 5000;

/// Download file types defined by CWMP, offered before any catalog types.
pub const STANDARD_FILE_TYPES: [&str; 5] = [
  "1 Firmware Upgrade Image",
  "2 Web Content",
  "3 Vendor Configuration File",
  "4 Tone File",
  "5 Ringer File",
];

/// Console-wide settings for the task drawer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
  /// Grace period (ms) between a dismissal request and actual removal.
  pub notification_grace_ms: u64,
  /// File types always offered for download tasks.
  pub standard_file_types: Vec<String>,
}

impl Default for ConsoleConfig {
  fn default() -> Self {
    Self {
      notification_grace_ms: DEFAULT_GRACE_MS,
      standard_file_types: STANDARD_FILE_TYPES.iter().map(|t| t.to_string()).collect(),
    }
  }
}

impl ConsoleConfig {
  pub fn grace_period(&self) -> Duration {
    Duration::from_millis(self.notification_grace_ms)
  }
}
