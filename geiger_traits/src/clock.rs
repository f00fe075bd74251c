use std::thread;
use std::time::{Duration, Instant};

/// Time source for window boundaries, dead time and loop idling.
///
/// The sampling loop and the pulse handler read the same clock, so a test
/// clock that advances on `sleep` drives a whole monitor deterministically.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Whole milliseconds since `epoch`; 0 if `epoch` is in the future.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let elapsed = self.now().saturating_duration_since(epoch);
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// `Instant`-backed clock used outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_in_the_future_reads_as_zero() {
        let clock = MonotonicClock::new();
        let later = Instant::now() + Duration::from_secs(5);
        assert_eq!(clock.ms_since(later), 0);
    }

    #[test]
    fn elapsed_time_is_counted_in_millis() {
        let clock = MonotonicClock::new();
        let epoch = Instant::now();
        clock.sleep(Duration::from_millis(3));
        assert!(clock.ms_since(epoch) >= 3);
    }
}
