//! Periodic drain of the pulse counter into a counts-per-minute sample.
//!
//! The sampler is polled from the main loop; it does not own a timer. When
//! more than one window length has elapsed since the window opened, the
//! counter is drained and a new window starts at the current time.
use std::num::NonZeroU64;

use crate::acquisition::PulseHandler;
use crate::util::MILLIS_PER_MINUTE;

/// How counts are scaled to a per-minute rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RateMath {
    /// `counts * 60000 / window_ms` in integer arithmetic (truncating).
    #[default]
    Truncate,
    /// Same ratio in floating point, no truncation.
    Float,
}

/// One counting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    pub start_ms: u64,
    /// Configured length; the rate denominator.
    pub duration_ms: NonZeroU64,
    /// Time actually elapsed between opening and closing the window.
    pub elapsed_ms: u64,
}

impl SampleWindow {
    /// How far the window ran past its configured length.
    #[inline]
    pub fn overrun_ms(&self) -> u64 {
        self.elapsed_ms.saturating_sub(self.duration_ms.get())
    }
}

/// Result of one sampling period. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub counts: u32,
    pub window: SampleWindow,
    /// Counts per minute. Whole-numbered under `RateMath::Truncate`.
    pub cpm: f64,
}

impl RateSample {
    /// Integer CPM (truncated) for integer-typed consumers.
    pub fn cpm_whole(&self) -> u32 {
        // cpm is finite and >= 0 by construction
        if self.cpm >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            self.cpm as u32
        }
    }
}

/// Counts-in-window to counts-per-minute, truncating.
///
/// 64-bit intermediates keep `counts * 60000` from overflowing; a result
/// that does not fit in `u32` (only possible for sub-minute windows with
/// absurd counts) saturates.
#[inline]
pub fn rate_per_minute(counts: u32, window_ms: NonZeroU64) -> u32 {
    let scaled = u64::from(counts) * MILLIS_PER_MINUTE / window_ms.get();
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Counts-in-window to counts-per-minute, without truncation.
#[inline]
pub fn rate_per_minute_exact(counts: u32, window_ms: NonZeroU64) -> f64 {
    f64::from(counts) * (MILLIS_PER_MINUTE as f64) / (window_ms.get() as f64)
}

#[derive(Debug, Clone)]
pub struct RateSampler {
    window_ms: NonZeroU64,
    math: RateMath,
    window_start_ms: u64,
}

impl RateSampler {
    pub fn new(window_ms: NonZeroU64, math: RateMath, now_ms: u64) -> Self {
        Self {
            window_ms,
            math,
            window_start_ms: now_ms,
        }
    }

    pub fn window_ms(&self) -> NonZeroU64 {
        self.window_ms
    }

    pub fn math(&self) -> RateMath {
        self.math
    }

    /// True once the elapsed time strictly exceeds the window length.
    #[inline]
    pub fn due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.window_start_ms) > self.window_ms.get()
    }

    /// Milliseconds until the current window closes (0 when already due).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.window_start_ms);
        (self.window_ms.get() + 1).saturating_sub(elapsed)
    }

    /// Close the current window: drain the counter and compute the rate.
    ///
    /// The rate is scaled by the configured window length, not by the
    /// elapsed time, so a window that closes a few ms late reports the same
    /// CPM it counted. The elapsed time is kept in the window so callers can
    /// spot a loop that resumed late.
    pub fn sample_period(&mut self, handler: &PulseHandler, now_ms: u64) -> RateSample {
        let counts = handler.drain();
        let window = SampleWindow {
            start_ms: self.window_start_ms,
            duration_ms: self.window_ms,
            elapsed_ms: now_ms.saturating_sub(self.window_start_ms),
        };
        self.window_start_ms = now_ms;
        let cpm = match self.math {
            RateMath::Truncate => f64::from(rate_per_minute(counts, self.window_ms)),
            RateMath::Float => rate_per_minute_exact(counts, self.window_ms),
        };
        RateSample {
            counts,
            window,
            cpm,
        }
    }

    /// Start a fresh window at `now_ms` without sampling.
    pub fn restart(&mut self, now_ms: u64) {
        self.window_start_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::DebounceCfg;
    use geiger_traits::{MonotonicClock, PulseLine};
    use rstest::rstest;
    use std::sync::Arc;

    fn nz(v: u64) -> NonZeroU64 {
        NonZeroU64::new(v).unwrap()
    }

    #[rstest]
    #[case(0, 60_000, 0)]
    #[case(123, 60_000, 123)]
    #[case(10, 15_000, 40)]
    #[case(7, 9_000, 46)] // 46.67 truncates
    #[case(1, 60_001, 0)]
    #[case(u32::MAX, 60_000, u32::MAX)]
    #[case(u32::MAX, 1, u32::MAX)] // saturates
    fn truncating_rate(#[case] counts: u32, #[case] window: u64, #[case] expected: u32) {
        assert_eq!(rate_per_minute(counts, nz(window)), expected);
    }

    #[test]
    fn exact_rate_keeps_fraction() {
        let r = rate_per_minute_exact(7, nz(9_000));
        assert!((r - 46.666_666_666).abs() < 1e-6);
    }

    #[test]
    fn due_only_after_window_strictly_exceeded() {
        let s = RateSampler::new(nz(1_000), RateMath::Truncate, 500);
        assert!(!s.due(1_500));
        assert!(s.due(1_501));
        assert_eq!(s.remaining_ms(500), 1_001);
        assert_eq!(s.remaining_ms(2_000), 0);
    }

    struct High;
    impl PulseLine for High {
        fn is_asserted(&self) -> bool {
            true
        }
    }

    #[test]
    fn sample_period_drains_and_opens_new_window() {
        let handler = PulseHandler::new(
            DebounceCfg {
                verify_level: false,
                max_spin_iters: 0,
                dead_time_ms: 0,
            },
            Arc::new(MonotonicClock::new()),
            std::time::Instant::now(),
        );
        for _ in 0..7 {
            handler.on_pulse_edge(&High);
        }
        let mut s = RateSampler::new(nz(9_000), RateMath::Float, 0);
        let sample = s.sample_period(&handler, 9_001);
        assert_eq!(sample.counts, 7);
        assert_eq!(sample.window.start_ms, 0);
        assert_eq!(sample.window.elapsed_ms, 9_001);
        assert_eq!(sample.window.overrun_ms(), 1);
        assert_eq!(sample.cpm_whole(), 46);
        assert!(sample.cpm > 46.6);
        assert_eq!(handler.pending(), 0);
        assert!(!s.due(9_002));
        assert!(s.due(18_002));
    }
}
