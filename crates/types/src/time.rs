//! Virtual simulation time.
//!
//! Time is an integer count of nanosecond ticks since the start of a run.
//! It is unrelated to wall-clock time and only the event loop advances it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One nanosecond, the base tick.
pub const NANOSECOND: u64 = 1;
/// Ticks per microsecond.
pub const MICROSECOND: u64 = 1_000 * NANOSECOND;
/// Ticks per millisecond.
pub const MILLISECOND: u64 = 1_000 * MICROSECOND;
/// Ticks per second.
pub const SECOND: u64 = 1_000 * MILLISECOND;
/// Ticks per minute.
pub const MINUTE: u64 = 60 * SECOND;
/// Ticks per hour.
pub const HOUR: u64 = 60 * MINUTE;

/// A point in virtual time, in nanosecond ticks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    /// Start of every run.
    pub const ZERO: Self = SimTime(0);

    /// Latest representable instant.
    pub const MAX: Self = SimTime(u64::MAX);

    /// Create from raw ticks.
    pub const fn from_nanos(ticks: u64) -> Self {
        SimTime(ticks)
    }

    /// Create from whole microseconds (saturating).
    pub const fn from_micros(us: u64) -> Self {
        SimTime(us.saturating_mul(MICROSECOND))
    }

    /// Create from whole milliseconds (saturating).
    pub const fn from_millis(ms: u64) -> Self {
        SimTime(ms.saturating_mul(MILLISECOND))
    }

    /// Create from whole seconds (saturating).
    pub const fn from_secs(secs: u64) -> Self {
        SimTime(secs.saturating_mul(SECOND))
    }

    /// Raw tick value.
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Time in seconds as a float, for reporting only.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / SECOND as f64
    }

    /// The instant `delay` ticks after `self`, or `None` on overflow.
    pub fn checked_add(self, delay: u64) -> Option<Self> {
        self.0.checked_add(delay).map(SimTime)
    }

    /// The instant `delay` ticks after `self`, clamped to [`SimTime::MAX`].
    pub fn saturating_add(self, delay: u64) -> Self {
        SimTime(self.0.saturating_add(delay))
    }

    /// Ticks elapsed since `earlier`, or `None` if `earlier` is later than `self`.
    pub fn duration_since(self, earlier: SimTime) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl From<Duration> for SimTime {
    /// Durations longer than ~584 years saturate.
    fn from(d: Duration) -> Self {
        SimTime(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl From<SimTime> for Duration {
    fn from(t: SimTime) -> Self {
        Duration::from_nanos(t.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.0 / SECOND, self.0 % SECOND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_constants() {
        assert_eq!(MICROSECOND, 1_000);
        assert_eq!(MILLISECOND, 1_000_000);
        assert_eq!(SECOND, 1_000_000_000);
        assert_eq!(HOUR, 3_600 * SECOND);
    }

    #[test]
    fn test_constructors() {
        assert_eq!(SimTime::from_secs(2), SimTime(2 * SECOND));
        assert_eq!(SimTime::from_millis(3).as_nanos(), 3_000_000);
        assert_eq!(SimTime::from_micros(7).as_nanos(), 7_000);
        assert_eq!(SimTime::from_secs(u64::MAX), SimTime::MAX);
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(SimTime(10).checked_add(5), Some(SimTime(15)));
        assert_eq!(SimTime::MAX.checked_add(1), None);
        assert_eq!(SimTime::MAX.saturating_add(1), SimTime::MAX);
    }

    #[test]
    fn test_duration_since() {
        assert_eq!(SimTime(30).duration_since(SimTime(10)), Some(20));
        assert_eq!(SimTime(10).duration_since(SimTime(30)), None);
    }

    #[test]
    fn test_duration_conversion() {
        let t = SimTime::from(Duration::from_millis(1500));
        assert_eq!(t, SimTime(1_500 * MILLISECOND));
        assert_eq!(Duration::from(t), Duration::from_millis(1500));
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime(1_500_000_000).to_string(), "1.500000000s");
        assert_eq!(SimTime::ZERO.to_string(), "0.000000000s");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&SimTime(42)).unwrap();
        assert_eq!(json, "42");
    }
}
