//! acsdesk Notify
//!
//! Transient operator notifications for the task drawer.
//!
//! # Lifecycle
//!
//! ```text
//! push ──► visible ──dismiss──► dismissing ──(grace period)──► removed
//! ```
//!
//! A dismissed notification stays listed (and its actions stay invokable)
//! until the grace period has elapsed. Removal is performed by
//! [`NotificationCenter::reap`], either called directly or driven by the
//! reaper task returned from [`NotificationCenter::spawn_reaper`].
//!
//! # Usage
//!
//! ```ignore
//! let center = Arc::new(NotificationCenter::new(Duration::from_secs(5)));
//! let reaper = center.clone().spawn_reaper();
//!
//! let ts = center.push(NotificationKind::Success, "dev1: Task(s) committed");
//! center.dismiss(ts)?;
//!
//! reaper.shutdown().await;
//! ```

mod center;
mod clock;
mod notification;

pub use center::{NotificationCenter, NotificationPhase, ReaperHandle};
pub use clock::{Clock, ManualClock, TokioClock};
pub use notification::{ActionHandler, Notification, NotificationAction, NotificationKind};

/// Errors from notification operations.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
  /// No live notification has this timestamp key.
  #[error("notification {timestamp} not found")]
  NotFound { timestamp: i64 },

  /// The notification has no action with this label.
  #[error("notification {timestamp} has no action '{label}'")]
  ActionNotFound { timestamp: i64, label: String },
}

/// Receives notifications raised by the drawer.
///
/// The drawer only pushes; what happens next (display, persistence, logging)
/// is up to the implementation.
pub trait NotificationSink: Send + Sync {
  /// Raise a notification.
  fn push(&self, kind: NotificationKind, message: String);

  /// Live notifications, oldest first.
  fn notifications(&self) -> Vec<Notification>;
}
