//! # Timestamp Value Object
//!
//! Epoch-millisecond timestamp used across quotes, reservations, deposits
//! and execution records.
//!
//! Wall-clock access is injected through the clock port in the
//! infrastructure layer; this type only carries and compares instants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A point in time as milliseconds since the Unix epoch.
///
/// # Examples
///
/// ```
/// use corridor::domain::value_objects::Timestamp;
///
/// let created = Timestamp::from_millis(1_700_000_000_000);
/// let expiry = created.add_secs(15);
/// assert!(expiry > created);
/// assert_eq!(expiry.millis_until(created), -15_000);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from epoch milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current wall-clock time.
    ///
    /// Production code reads time through the injected clock port; this
    /// constructor backs the system clock implementation.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Returns the epoch milliseconds.
    #[inline]
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Returns this timestamp shifted forward by whole seconds.
    #[inline]
    #[must_use]
    pub const fn add_secs(self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs.saturating_mul(1000)))
    }

    /// Returns this timestamp shifted forward by milliseconds.
    #[inline]
    #[must_use]
    pub const fn add_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns the signed distance in milliseconds from `earlier` to `self`;
    /// negative when `self` precedes `earlier`.
    #[inline]
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Returns the signed distance in milliseconds from `self` to `later`;
    /// negative when `later` precedes `self`.
    #[inline]
    #[must_use]
    pub const fn millis_until(self, later: Self) -> i64 {
        later.0.saturating_sub(self.0)
    }

    /// Returns true if `self` is strictly before `other`.
    #[inline]
    #[must_use]
    pub const fn is_before(self, other: Self) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Timestamp {
    #[inline]
    fn from(millis: i64) -> Self {
        Self(millis)
    }
}
