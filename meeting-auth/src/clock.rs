//! Wall-clock source for token expiry and signature timestamps.

#[cfg(test)]
use std::sync::atomic::{AtomicI64, Ordering};

#[cfg(test)]
use chrono::Duration;
use chrono::{DateTime, TimeZone, Utc};

/// Source of the current time.
///
/// Everything time-dependent in this crate reads the clock through this trait so
/// expiry decisions can be tested at exact instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock with one-second resolution.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    unix_seconds: AtomicI64,
}

#[cfg(test)]
impl ManualClock {
    /// Create a clock frozen at `unix_seconds`.
    pub fn new(unix_seconds: i64) -> Self {
        Self {
            unix_seconds: AtomicI64::new(unix_seconds),
        }
    }

    /// Move the clock forward (or backward, for negative values).
    pub fn advance(&self, by: Duration) {
        self.unix_seconds
            .fetch_add(by.num_seconds(), Ordering::SeqCst);
    }

    pub fn set(&self, unix_seconds: i64) {
        self.unix_seconds.store(unix_seconds, Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.unix_seconds.load(Ordering::SeqCst), 0)
            .single()
            .unwrap_or_default()
    }
}

/// Current time truncated to whole seconds.
pub(crate) fn now_seconds(clock: &dyn Clock) -> DateTime<Utc> {
    let now = clock.now();
    Utc.timestamp_opt(now.timestamp(), 0)
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_700_000_000);
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now().timestamp(), 1_700_000_090);

        clock.set(5);
        assert_eq!(clock.now().timestamp(), 5);
    }

    #[test]
    fn test_now_seconds_drops_subsecond_part() {
        let now = now_seconds(&SystemClock);
        assert_eq!(now.timestamp_subsec_nanos(), 0);
    }
}
