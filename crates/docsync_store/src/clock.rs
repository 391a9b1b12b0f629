//! Time sources for modification stamps.

use parking_lot::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// A source of wall-clock time.
///
/// The store never trusts the clock to be monotonic; it only uses it as a
/// lower bound for the next stamp.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Timestamp::try_from(d.as_millis()).unwrap_or(Timestamp::MAX))
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Sets the current reading. Moving backwards is allowed.
    pub fn set(&self, now: Timestamp) {
        *self.now.lock() = now;
    }

    /// Moves the reading forward by `millis`.
    pub fn advance(&self, millis: Timestamp) {
        *self.now.lock() += millis;
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Timestamp {
        *self.now.lock()
    }
}
