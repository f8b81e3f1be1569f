//! Time source abstraction.
//!
//! Auction transitions hinge on wall-clock deadlines, so the registry
//! reads time through a [`Clock`] capability instead of calling
//! `Utc::now()` inline. Production uses [`SystemClock`]; tests drive a
//! [`ManualClock`] past `end_time` without sleeping.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Source of the current time for deadline checks.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the operating system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Creates a clock frozen at the current system time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Jumps the clock to `instant`. Moving backwards is allowed; the
    /// registry never assumes monotonicity of the capability itself.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.write() = instant;
    }

    /// Advances the clock by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        let mut now = self.now.write();
        *now += Duration::seconds(secs as i64);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}
