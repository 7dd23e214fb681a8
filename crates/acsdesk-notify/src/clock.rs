use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Monotonic time source for grace-period bookkeeping.
pub trait Clock: Send + Sync {
  fn now(&self) -> Instant;
}

/// Clock backed by the tokio timer (honours `tokio::time::pause`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<Instant>,
}

impl ManualClock {
  pub fn new() -> Self {
    Self {
      now: Mutex::new(Instant::now()),
    }
  }

  pub fn advance(&self, by: Duration) {
    let mut now = self.now.lock().unwrap();
    *now += by;
  }
}

impl Default for ManualClock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Instant {
    *self.now.lock().unwrap()
  }
}
