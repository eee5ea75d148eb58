//! Time sources
//!
//! The engine never reads the wall clock directly. It asks a [`Clock`], which
//! lets tests and the replay CLI drive timers deterministically.

use chrono::{DateTime, Duration, Local, Timelike, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// A source of "now" for timers, mood records and time-of-day derivation
pub trait Clock {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Local wall-clock hour (0-23) used for time-of-day bias
    fn local_hour(&self) -> u32;

    /// Current instant as milliseconds since the Unix epoch
    fn now_ms(&self) -> u64 {
        self.now().timestamp_millis().max(0) as u64
    }
}

/// Clock backed by the system time and local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }
}

/// Manually advanced clock.
///
/// Clones share the same underlying time, so a test can hold one handle while
/// the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
    hour: Rc<Cell<Option<u32>>>,
}

impl ManualClock {
    /// Create a clock starting at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
            hour: Rc::new(Cell::new(None)),
        }
    }

    /// Create a clock starting at `start` that reports a fixed local hour
    pub fn with_hour(start: DateTime<Utc>, hour: u32) -> Self {
        let clock = Self::new(start);
        clock.set_hour(hour);
        clock
    }

    /// Move time forward by `ms` milliseconds.
    ///
    /// Returns `false` and leaves the clock untouched if the result is not
    /// representable.
    pub fn advance_ms(&self, ms: u64) -> bool {
        let next = i64::try_from(ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .and_then(|delta| self.now.get().checked_add_signed(delta));
        match next {
            Some(next) => {
                self.now.set(next);
                true
            }
            None => {
                log::warn!("manual clock cannot advance by {ms} ms; time unchanged");
                false
            }
        }
    }

    /// Jump to an absolute instant (ignored if it would move time backwards)
    pub fn set(&self, instant: DateTime<Utc>) {
        if instant >= self.now.get() {
            self.now.set(instant);
        }
    }

    /// Pin the reported local hour. Unpinned clocks report the UTC hour of `now`.
    pub fn set_hour(&self, hour: u32) {
        self.hour.set(Some(hour % 24));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn local_hour(&self) -> u32 {
        self.hour.get().unwrap_or_else(|| self.now.get().hour())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let handle = clock.clone();

        handle.advance_ms(2_500);
        assert_eq!(clock.now_ms(), start.timestamp_millis() as u64 + 2_500);
    }

    #[test]
    fn test_manual_clock_rejects_unrepresentable_advance() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert!(!clock.advance_ms(u64::MAX));
        assert!(!clock.advance_ms(i64::MAX as u64));
        assert_eq!(clock.now(), start);
        assert!(clock.advance_ms(1));
    }

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.set(start - Duration::seconds(10));
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_manual_clock_hour() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.local_hour(), 9);

        clock.set_hour(22);
        assert_eq!(clock.local_hour(), 22);
    }
}
