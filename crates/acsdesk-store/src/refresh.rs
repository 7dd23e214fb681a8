use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

/// Process-wide "last refreshed" side channel.
///
/// Setting the timestamp tells dependent views that their data is out of date
/// and should be fetched again.
pub trait RefreshSignal: Send + Sync {
  fn set_timestamp(&self, value: DateTime<Utc>);
}

/// A refresh signal backed by a watch channel.
///
/// Views subscribe and re-fetch whenever the value changes.
#[derive(Debug)]
pub struct WatchRefreshSignal {
  sender: watch::Sender<Option<DateTime<Utc>>>,
  updates: AtomicUsize,
}

impl WatchRefreshSignal {
  pub fn new() -> Self {
    let (sender, _) = watch::channel(None);
    Self {
      sender,
      updates: AtomicUsize::new(0),
    }
  }

  /// Subscribe to timestamp changes.
  pub fn subscribe(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
    self.sender.subscribe()
  }

  /// The last timestamp set, if any.
  pub fn last(&self) -> Option<DateTime<Utc>> {
    *self.sender.borrow()
  }

  /// How many times the timestamp has been set.
  pub fn updates(&self) -> usize {
    self.updates.load(Ordering::Acquire)
  }
}

impl Default for WatchRefreshSignal {
  fn default() -> Self {
    Self::new()
  }
}

impl RefreshSignal for WatchRefreshSignal {
  fn set_timestamp(&self, value: DateTime<Utc>) {
    debug!(timestamp = %value, "refresh_signalled");
    // send_replace never fails, even without receivers
    self.sender.send_replace(Some(value));
    self.updates.fetch_add(1, Ordering::AcqRel);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_subscribers_see_new_timestamp() {
    let signal = WatchRefreshSignal::new();
    let mut rx = signal.subscribe();
    assert_eq!(signal.last(), None);

    let now = Utc::now();
    signal.set_timestamp(now);

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), Some(now));
    assert_eq!(signal.last(), Some(now));
    assert_eq!(signal.updates(), 1);
  }
}
