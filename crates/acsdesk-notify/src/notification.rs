use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Severity tag of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
  Success,
  Warning,
  Error,
  #[default]
  Primary,
  Secondary,
  Info,
  Light,
  Dark,
}

impl NotificationKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      NotificationKind::Success => "success",
      NotificationKind::Warning => "warning",
      NotificationKind::Error => "error",
      NotificationKind::Primary => "primary",
      NotificationKind::Secondary => "secondary",
      NotificationKind::Info => "info",
      NotificationKind::Light => "light",
      NotificationKind::Dark => "dark",
    }
  }
}

impl fmt::Display for NotificationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Callback run when the operator clicks a notification action.
pub type ActionHandler = Arc<dyn Fn() + Send + Sync>;

/// A labelled button attached to a notification.
#[derive(Clone)]
pub struct NotificationAction {
  pub label: String,
  pub(crate) handler: ActionHandler,
}

impl NotificationAction {
  pub fn new(label: impl Into<String>, handler: impl Fn() + Send + Sync + 'static) -> Self {
    Self {
      label: label.into(),
      handler: Arc::new(handler),
    }
  }
}

impl fmt::Debug for NotificationAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NotificationAction")
      .field("label", &self.label)
      .finish_non_exhaustive()
  }
}

/// A transient message shown to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
  #[serde(rename = "type")]
  pub kind: NotificationKind,
  pub message: String,
  /// Action buttons, in display order.
  #[serde(skip)]
  pub actions: Vec<NotificationAction>,
  /// Creation time in Unix millis. Unique per process; doubles as the key.
  pub timestamp: i64,
}

impl Notification {
  pub fn action_labels(&self) -> impl Iterator<Item = &str> {
    self.actions.iter().map(|a| a.label.as_str())
  }
}
