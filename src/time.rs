//! Time abstractions for testability.
//!
//! - [`Clock`] supplies wall-clock timestamps (used when synthesizing responses).
//! - [`Sleeper`] supplies deferred scheduling (used between poll attempts).
//!
//! Production code uses [`SystemClock`] and [`TokioSleeper`]; tests inject
//! fixed clocks and [`InstantSleeper`].

use std::time::{Duration, SystemTime};

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of wall-clock time for response timestamps.
///
/// # Example
///
/// ```
/// use automation_relay::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now >= std::time::SystemTime::UNIX_EPOCH);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// Reads [`SystemTime::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Formats a timestamp as an ISO-8601 / RFC 3339 string in UTC with millisecond precision.
#[must_use]
pub fn iso8601(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Abstraction over asynchronous delays.
///
/// Deferred scheduling goes through this trait so that tests can run
/// polling loops without real waits.
pub trait Sleeper: Send + Sync {
    /// Completes after `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production sleeper backed by [`tokio::time::sleep`].
///
/// Respects tokio's paused clock in tests (`start_paused = true`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately, yielding once to the scheduler.
///
/// Intended for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(SystemTime);

    impl Clock for FixedClock {
        fn now(&self) -> SystemTime {
            self.0
        }
    }

    #[test]
    fn system_clock_is_between_reads() {
        let before = SystemTime::now();
        let result = SystemClock.now();
        let after = SystemTime::now();

        assert!(before <= result && result <= after);
    }

    #[test]
    fn clocks_are_usable_as_trait_objects() {
        let clock: Box<dyn Clock> =
            Box::new(FixedClock(SystemTime::UNIX_EPOCH + Duration::from_secs(86_400)));
        assert_eq!(iso8601(clock.now()), "1970-01-02T00:00:00.000Z");
    }

    #[test]
    fn iso8601_formats_epoch() {
        assert_eq!(iso8601(SystemTime::UNIX_EPOCH), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn iso8601_keeps_milliseconds() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(iso8601(time), "2023-11-14T22:13:20.123Z");
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_waits_for_duration() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(2)).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn instant_sleeper_does_not_advance_time() {
        let start = tokio::time::Instant::now();
        InstantSleeper.sleep(Duration::from_secs(60)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn iso8601_drops_sub_millisecond_precision() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_nanos(1_500_999);
        assert_eq!(iso8601(time), "1970-01-01T00:00:00.001Z");
    }
}
