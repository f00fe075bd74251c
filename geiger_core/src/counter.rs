//! Raw pulse tally shared between the edge handler and the sampler.
//!
//! The only reset is [`PulseCounter::drain`], a single atomic swap, so a
//! pulse recorded concurrently with a drain lands either in the drained
//! value or in the next window, never in both and never in neither.
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Default)]
pub struct PulseCounter {
    count: AtomicU32,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Count one accepted pulse. Wraps at `u32::MAX`.
    #[inline]
    pub(crate) fn record(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Take the current tally and reset it to zero in one step.
    #[inline]
    pub fn drain(&self) -> u32 {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// Current tally without resetting (diagnostics only).
    #[inline]
    pub fn peek(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}
