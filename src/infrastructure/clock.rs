//! # Clock Port
//!
//! Injectable source of wall-clock time.
//!
//! Every TTL computation, expiry check and record timestamp reads time
//! through this port so tests can pin the clock and step it manually.

use crate::domain::value_objects::Timestamp;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Millisecond-epoch clock.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// # Examples
///
/// ```
/// use corridor::infrastructure::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::at(1_000);
/// clock.advance_millis(500);
/// assert_eq!(clock.now().millis(), 1_500);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Creates a clock pinned at the given epoch milliseconds.
    #[must_use]
    pub fn at(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Moves the clock forward.
    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Moves the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance_millis(secs * 1000);
    }

    /// Pins the clock to an absolute instant.
    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}
