//! Notification lifecycle manager.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use acsdesk_config::ConsoleConfig;
use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clock::{Clock, TokioClock};
use crate::notification::{Notification, NotificationAction, NotificationKind};
use crate::{NotificationSink, NotifyError};

/// Where a live notification is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPhase {
  Visible,
  /// Dismissal requested; removed once `remaining` has elapsed.
  Dismissing { remaining: Duration },
}

struct Entry {
  notification: Notification,
  dismissed_at: Option<Instant>,
}

#[derive(Default)]
struct State {
  live: Vec<Entry>,
  last_key: i64,
}

/// Owns the live notification set and its grace-period removals.
pub struct NotificationCenter {
  grace: Duration,
  clock: Arc<dyn Clock>,
  state: Mutex<State>,
  wake: Notify,
}

impl NotificationCenter {
  /// Create a notification center on the tokio clock.
  pub fn new(grace: Duration) -> Self {
    Self::with_clock(grace, Arc::new(TokioClock))
  }

  pub fn from_config(config: &ConsoleConfig) -> Self {
    Self::new(config.grace_period())
  }

  /// Create a notification center with a custom clock.
  ///
  /// Use a [`ManualClock`](crate::ManualClock) in tests and call
  /// [`reap`](Self::reap) directly.
  pub fn with_clock(grace: Duration, clock: Arc<dyn Clock>) -> Self {
    Self {
      grace,
      clock,
      state: Mutex::new(State::default()),
      wake: Notify::new(),
    }
  }

  pub fn grace_period(&self) -> Duration {
    self.grace
  }

  /// Raise a notification and return its timestamp key.
  pub fn push(&self, kind: NotificationKind, message: impl Into<String>) -> i64 {
    self.push_with_actions(kind, message, Vec::new())
  }

  /// Raise a notification carrying action buttons.
  pub fn push_with_actions(
    &self,
    kind: NotificationKind,
    message: impl Into<String>,
    actions: Vec<NotificationAction>,
  ) -> i64 {
    let message = message.into();
    let mut state = self.state.lock().unwrap();

    // Wall-clock millis, bumped so keys never repeat within the process
    let timestamp = Utc::now().timestamp_millis().max(state.last_key + 1);
    state.last_key = timestamp;

    info!(timestamp, kind = %kind, message = %message, "notification_pushed");

    state.live.push(Entry {
      notification: Notification {
        kind,
        message,
        actions,
        timestamp,
      },
      dismissed_at: None,
    });
    timestamp
  }

  /// Request removal of a notification.
  ///
  /// The notification stays live for the grace period, counted from the
  /// first request. Repeated requests leave the deadline unchanged.
  pub fn dismiss(&self, timestamp: i64) -> Result<(), NotifyError> {
    let now = self.clock.now();
    {
      let mut state = self.state.lock().unwrap();
      let entry = state
        .live
        .iter_mut()
        .find(|e| e.notification.timestamp == timestamp)
        .ok_or(NotifyError::NotFound { timestamp })?;

      if entry.dismissed_at.is_some() {
        debug!(timestamp, "notification already dismissing");
        return Ok(());
      }
      entry.dismissed_at = Some(now);
    }

    debug!(timestamp, grace_ms = self.grace.as_millis() as u64, "notification_dismissed");
    self.wake.notify_one();
    Ok(())
  }

  /// Lifecycle phase of a live notification.
  pub fn phase(&self, timestamp: i64) -> Option<NotificationPhase> {
    let now = self.clock.now();
    let state = self.state.lock().unwrap();
    let entry = state
      .live
      .iter()
      .find(|e| e.notification.timestamp == timestamp)?;

    Some(match entry.dismissed_at {
      None => NotificationPhase::Visible,
      Some(at) => NotificationPhase::Dismissing {
        remaining: (at + self.grace).saturating_duration_since(now),
      },
    })
  }

  /// Run the handler of a notification action.
  ///
  /// Actions stay invokable while the notification is dismissing.
  pub fn invoke(&self, timestamp: i64, label: &str) -> Result<(), NotifyError> {
    let handler = {
      let state = self.state.lock().unwrap();
      let entry = state
        .live
        .iter()
        .find(|e| e.notification.timestamp == timestamp)
        .ok_or(NotifyError::NotFound { timestamp })?;

      entry
        .notification
        .actions
        .iter()
        .find(|a| a.label == label)
        .map(|a| a.handler.clone())
        .ok_or_else(|| NotifyError::ActionNotFound {
          timestamp,
          label: label.to_string(),
        })?
    };

    // Handlers may push notifications, so run them unlocked
    handler();
    Ok(())
  }

  /// Remove every notification whose grace period has elapsed.
  ///
  /// Returns the removed notifications, oldest first.
  pub fn reap(&self) -> Vec<Notification> {
    let now = self.clock.now();
    let mut state = self.state.lock().unwrap();

    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(state.live.len());
    for entry in state.live.drain(..) {
      match entry.dismissed_at {
        Some(at) if now >= at + self.grace => removed.push(entry.notification),
        _ => kept.push(entry),
      }
    }
    state.live = kept;

    for n in &removed {
      debug!(timestamp = n.timestamp, "notification_removed");
    }
    removed
  }

  /// The earliest pending removal deadline.
  pub fn next_deadline(&self) -> Option<Instant> {
    let state = self.state.lock().unwrap();
    state
      .live
      .iter()
      .filter_map(|e| e.dismissed_at)
      .min()
      .map(|at| at + self.grace)
  }

  /// Remove dismissed notifications as their grace periods elapse.
  ///
  /// Runs until `cancel` is triggered.
  pub async fn run_reaper(&self, cancel: CancellationToken) {
    loop {
      let notified = self.wake.notified();
      let deadline = self.next_deadline();

      tokio::select! {
        _ = cancel.cancelled() => break,
        _ = notified => {}
        _ = sleep_until(deadline) => {
          let removed = self.reap();
          let pending = self.next_deadline().is_some_and(|d| d > Instant::now());
          if removed.is_empty() && !pending {
            // Deadline passed on the tokio timer but not on the center's
            // clock; wait for the next dismissal
            tokio::select! {
              _ = cancel.cancelled() => break,
              _ = self.wake.notified() => {}
            }
          }
        }
      }
    }
    debug!("notification reaper stopped");
  }

  /// Spawn [`run_reaper`](Self::run_reaper) on the current runtime.
  pub fn spawn_reaper(self: Arc<Self>) -> ReaperHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move { self.run_reaper(token).await });
    ReaperHandle { cancel, handle }
  }
}

async fn sleep_until(deadline: Option<Instant>) {
  match deadline {
    Some(deadline) => tokio::time::sleep_until(deadline).await,
    None => std::future::pending().await,
  }
}

impl NotificationSink for NotificationCenter {
  fn push(&self, kind: NotificationKind, message: String) {
    NotificationCenter::push(self, kind, message);
  }

  fn notifications(&self) -> Vec<Notification> {
    let state = self.state.lock().unwrap();
    state.live.iter().map(|e| e.notification.clone()).collect()
  }
}

/// Handle to a spawned reaper task.
pub struct ReaperHandle {
  cancel: CancellationToken,
  handle: JoinHandle<()>,
}

impl ReaperHandle {
  /// Stop the reaper and wait for it to exit.
  pub async fn shutdown(self) {
    self.cancel.cancel();
    // A panicked reaper has nothing left to clean up
    let _ = self.handle.await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::ManualClock;
  use std::sync::atomic::{AtomicUsize, Ordering};

  const GRACE: Duration = Duration::from_secs(5);

  fn manual_center() -> (NotificationCenter, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (NotificationCenter::with_clock(GRACE, clock.clone()), clock)
  }

  #[test]
  fn test_keys_are_unique_and_ordered() {
    let (center, _) = manual_center();
    let keys: Vec<i64> = (0..50)
      .map(|i| center.push(NotificationKind::Info, format!("n{i}")))
      .collect();

    assert!(keys.windows(2).all(|w| w[0] < w[1]));

    let live = center.notifications();
    assert_eq!(live.len(), 50);
    assert_eq!(live[0].message, "n0");
    assert_eq!(live[49].message, "n49");
  }

  #[test]
  fn test_dismiss_waits_for_grace_period() {
    let (center, clock) = manual_center();
    let ts = center.push(NotificationKind::Success, "dev1: Task(s) committed");

    center.dismiss(ts).unwrap();
    assert_eq!(
      center.phase(ts),
      Some(NotificationPhase::Dismissing { remaining: GRACE })
    );

    clock.advance(GRACE - Duration::from_millis(1));
    assert!(center.reap().is_empty());
    assert_eq!(center.notifications().len(), 1);

    clock.advance(Duration::from_millis(1));
    let removed = center.reap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].timestamp, ts);
    assert!(center.notifications().is_empty());
    assert_eq!(center.phase(ts), None);
  }

  #[test]
  fn test_repeated_dismiss_keeps_first_deadline() {
    let (center, clock) = manual_center();
    let ts = center.push(NotificationKind::Error, "dev1: No contact from device");

    center.dismiss(ts).unwrap();
    clock.advance(Duration::from_secs(1));
    center.dismiss(ts).unwrap();

    // Not shortened
    assert!(center.reap().is_empty());

    // Not restarted either
    clock.advance(Duration::from_secs(4));
    assert_eq!(center.reap().len(), 1);
  }

  #[test]
  fn test_only_dismissed_notifications_are_reaped() {
    let (center, clock) = manual_center();
    let first = center.push(NotificationKind::Info, "first");
    let second = center.push(NotificationKind::Info, "second");

    center.dismiss(first).unwrap();
    clock.advance(GRACE * 2);
    center.reap();

    let live = center.notifications();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].timestamp, second);
    assert_eq!(center.phase(second), Some(NotificationPhase::Visible));
  }

  #[test]
  fn test_dismiss_unknown_notification() {
    let (center, _) = manual_center();
    assert!(matches!(
      center.dismiss(42),
      Err(NotifyError::NotFound { timestamp: 42 })
    ));
  }

  #[test]
  fn test_actions_invokable_while_dismissing() {
    let (center, _) = manual_center();
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = clicks.clone();

    let ts = center.push_with_actions(
      NotificationKind::Warning,
      "dev1: Task(s) faulted",
      vec![NotificationAction::new("Retry", move || {
        counter.fetch_add(1, Ordering::SeqCst);
      })],
    );

    center.invoke(ts, "Retry").unwrap();
    center.dismiss(ts).unwrap();
    center.invoke(ts, "Retry").unwrap();
    assert_eq!(clicks.load(Ordering::SeqCst), 2);

    assert!(matches!(
      center.invoke(ts, "Ignore"),
      Err(NotifyError::ActionNotFound { .. })
    ));
    assert_eq!(
      center.notifications()[0].action_labels().collect::<Vec<_>>(),
      vec!["Retry"]
    );
  }

  #[test]
  fn test_next_deadline_is_earliest_dismissal() {
    let (center, clock) = manual_center();
    let a = center.push(NotificationKind::Info, "a");
    let b = center.push(NotificationKind::Info, "b");
    assert_eq!(center.next_deadline(), None);

    let start = clock.now();
    center.dismiss(b).unwrap();
    clock.advance(Duration::from_secs(2));
    center.dismiss(a).unwrap();

    assert_eq!(center.next_deadline(), Some(start + GRACE));
  }

  #[tokio::test(start_paused = true)]
  async fn test_reaper_removes_after_grace_period() {
    let center = Arc::new(NotificationCenter::new(GRACE));
    let reaper = center.clone().spawn_reaper();

    let ts = center.push(NotificationKind::Success, "dev1: Task(s) committed");
    center.dismiss(ts).unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(center.notifications().len(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(center.notifications().is_empty());

    reaper.shutdown().await;
  }

  #[tokio::test(start_paused = true)]
  async fn test_reaper_continues_after_manual_reap() {
    let center = Arc::new(NotificationCenter::new(GRACE));
    let reaper = center.clone().spawn_reaper();

    let a = center.push(NotificationKind::Info, "a");
    let b = center.push(NotificationKind::Info, "b");
    center.dismiss(a).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    center.dismiss(b).unwrap();

    // A direct reap takes `a` before the reaper wakes for it
    tokio::time::sleep(Duration::from_secs(4)).await;
    center.reap();
    assert_eq!(center.phase(a), None);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(center.notifications().is_empty());
    assert_eq!(center.phase(b), None);

    reaper.shutdown().await;
  }

  #[tokio::test(start_paused = true)]
  async fn test_reaper_shutdown_leaves_pending_removals() {
    let center = Arc::new(NotificationCenter::new(GRACE));
    let reaper = center.clone().spawn_reaper();

    let ts = center.push(NotificationKind::Info, "pending");
    center.dismiss(ts).unwrap();
    reaper.shutdown().await;

    tokio::time::sleep(GRACE * 2).await;
    assert_eq!(center.notifications().len(), 1);

    // Manual reaping still honours the deadline
    assert_eq!(center.reap().len(), 1);
  }
}
