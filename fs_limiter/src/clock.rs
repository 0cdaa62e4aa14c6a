use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use time::OffsetDateTime;
use time::UtcOffset;

use crate::error::RateLimitError;
use crate::error::Result;

/// Source of the current instant for a limiter
///
/// Window boundaries are computed from whatever this returns, so swapping in a
/// [`ManualClock`] makes every decision deterministic.
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> OffsetDateTime;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same instant, so a test can hand one clone to a limiter and
/// keep another to advance time.
///
/// ```
/// use std::time::Duration;
///
/// use fs_limiter::Clock;
/// use fs_limiter::ManualClock;
/// use time::macros::datetime;
///
/// let clock = ManualClock::new(datetime!(2009-11-10 23:00 UTC));
/// let handle = clock.clone();
///
/// handle.advance(Duration::from_secs(5));
/// assert_eq!(clock.now(), datetime!(2009-11-10 23:00:05 UTC));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<OffsetDateTime>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: OffsetDateTime) -> Self {
        Self { current: Arc::new(Mutex::new(start.to_offset(UtcOffset::UTC))) }
    }

    /// Move the clock forward by `duration`
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock();
        *current += duration;
    }

    /// Jump to a specific instant
    pub fn set(&self, instant: OffsetDateTime) {
        *self.current.lock() = instant.to_offset(UtcOffset::UTC);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.current.lock()
    }
}

/// Convert an instant to nanoseconds since the Unix epoch
#[inline]
pub(crate) fn timestamp_nanos(instant: OffsetDateTime) -> Result<i64> {
    i64::try_from(instant.unix_timestamp_nanos()).map_err(|_| RateLimitError::TimeError)
}

/// Convert a duration to nanoseconds, `None` if it does not fit in an i64
#[inline]
pub(crate) fn duration_to_nanos(duration: Duration) -> Option<i64> {
    i64::try_from(duration.as_nanos()).ok()
}
