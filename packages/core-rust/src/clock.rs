//! Monotonic clock for event and snapshot timestamps.
//!
//! Wall-clock time is read through [`ClockSource`] so tests can inject a
//! [`ManualClock`]. [`MonotonicClock`] layers a logical counter on top so that
//! two timestamps taken by the same clock never compare equal or go backwards,
//! even when the wall clock stalls or is stepped back by NTP.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A timestamp combining wall-clock milliseconds with a logical counter.
///
/// Ordering is millis first, then counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Wall-clock milliseconds since Unix epoch.
    pub millis: u64,
    /// Logical counter for timestamps taken within the same millisecond.
    pub counter: u32,
}

impl Timestamp {
    /// Calendar date (UTC) of this timestamp.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        date_from_millis(self.millis)
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.millis
            .cmp(&other.millis)
            .then_with(|| self.counter.cmp(&other.counter))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Converts epoch milliseconds into a UTC calendar date.
///
/// Out-of-range values clamp to the Unix epoch date.
#[must_use]
pub fn date_from_millis(millis: u64) -> NaiveDate {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default()
        .date_naive()
}

/// Abstraction over the system clock for dependency injection.
///
/// The default implementation ([`SystemClock`]) delegates to
/// `std::time::SystemTime`.
pub trait ClockSource: Send + Sync {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now(&self) -> u64;

    /// Today's calendar date (UTC).
    fn today(&self) -> NaiveDate {
        date_from_millis(self.now())
    }
}

/// Clock source that reads the real system time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> u64 {
        // A system clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Settable clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Clock pinned to midnight UTC of the given date.
    #[must_use]
    pub fn at_date(date: NaiveDate) -> Self {
        let millis = date
            .and_hms_opt(0, 0, 0)
            .map_or(0, |dt| dt.and_utc().timestamp_millis());
        Self::new(u64::try_from(millis).unwrap_or(0))
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, AtomicOrdering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.millis.fetch_add(delta_ms, AtomicOrdering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> u64 {
        self.millis.load(AtomicOrdering::SeqCst)
    }
}

/// Issues strictly increasing [`Timestamp`]s.
///
/// When the source clock advances, the counter resets to 0. When the source
/// clock is unchanged or behind the last issued millis, the last millis is
/// kept and the counter increments. A saturated counter carries into millis.
pub struct MonotonicClock {
    last: Mutex<Timestamp>,
    source: Arc<dyn ClockSource>,
}

impl MonotonicClock {
    #[must_use]
    pub fn new(source: Arc<dyn ClockSource>) -> Self {
        Self {
            last: Mutex::new(Timestamp {
                millis: 0,
                counter: 0,
            }),
            source,
        }
    }

    /// Monotonic clock over the real system time.
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Returns the next timestamp, strictly greater than every earlier one.
    pub fn now(&self) -> Timestamp {
        let physical = self.source.now();
        let mut last = self.last.lock();
        let next = if physical > last.millis {
            Timestamp {
                millis: physical,
                counter: 0,
            }
        } else {
            if physical < last.millis {
                tracing::debug!(
                    physical,
                    last = last.millis,
                    "clock source moved backwards, holding last millis"
                );
            }
            match last.counter.checked_add(1) {
                Some(counter) => Timestamp {
                    millis: last.millis,
                    counter,
                },
                None => Timestamp {
                    millis: last.millis.saturating_add(1),
                    counter: 0,
                },
            }
        };
        *last = next;
        next
    }

    /// Access the underlying wall-clock source.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn ClockSource> {
        &self.source
    }

    /// Today's date according to the underlying source.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.source.today()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for MonotonicClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonotonicClock")
            .field("last", &*self.last.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn timestamp_ordering_millis_first() {
        let a = Timestamp { millis: 100, counter: 5 };
        let b = Timestamp { millis: 200, counter: 0 };
        assert!(a < b);
    }

    #[test]
    fn timestamp_ordering_counter_second() {
        let a = Timestamp { millis: 100, counter: 1 };
        let b = Timestamp { millis: 100, counter: 2 };
        assert!(a < b);
    }

    #[test]
    fn counter_increments_when_clock_stalls() {
        let source = Arc::new(ManualClock::new(1_000));
        let clock = MonotonicClock::new(source.clone());
        let a = clock.now();
        let b = clock.now();
        assert_eq!(a, Timestamp { millis: 1_000, counter: 0 });
        assert_eq!(b, Timestamp { millis: 1_000, counter: 1 });

        source.advance(5);
        assert_eq!(clock.now(), Timestamp { millis: 1_005, counter: 0 });
    }

    #[test]
    fn saturated_counter_carries_into_millis() {
        let source = Arc::new(ManualClock::new(1_000));
        let clock = MonotonicClock::new(source);
        *clock.last.lock() = Timestamp {
            millis: 1_000,
            counter: u32::MAX,
        };
        let next = clock.now();
        assert_eq!(next, Timestamp { millis: 1_001, counter: 0 });
        assert!(clock.now() > next);
    }

    #[test]
    fn clock_stepping_backwards_does_not_regress() {
        let source = Arc::new(ManualClock::new(5_000));
        let clock = MonotonicClock::new(source.clone());
        let before = clock.now();
        source.set(1_000);
        let after = clock.now();
        assert!(after > before);
        assert_eq!(after.millis, 5_000);
    }

    #[test]
    fn manual_clock_at_date_reports_that_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let clock = ManualClock::at_date(date);
        assert_eq!(clock.today(), date);
        clock.advance(23 * 3_600_000);
        assert_eq!(clock.today(), date);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800_000);
    }

    proptest! {
        #[test]
        fn timestamps_strictly_increase(steps in proptest::collection::vec(-50i64..50, 1..64)) {
            let source = Arc::new(ManualClock::new(10_000));
            let clock = MonotonicClock::new(source.clone());
            let mut prev = clock.now();
            for step in steps {
                let next_millis = source.now().saturating_add_signed(step);
                source.set(next_millis);
                let ts = clock.now();
                prop_assert!(ts > prev);
                prev = ts;
            }
        }
    }
}
