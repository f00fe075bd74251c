pub mod error;
pub mod thermal;
pub mod util;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

use geiger_traits::{BoxError, EdgeSource, PulseLine};
use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Environment override for the simulated mean rate (counts per minute).
pub const SIM_CPM_ENV: &str = "GEIGER_SIM_CPM";

/// Which transition of the tube interface output marks a pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseEdge {
    Rising,
    Falling,
}

/// Tiny xorshift PRNG; deterministic per seed.
#[derive(Debug, Clone)]
struct XorShift32(u32);

impl XorShift32 {
    fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    /// Uniform sample in (0, 1].
    fn next_unit(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (f64::from(x) + 1.0) / (f64::from(u32::MAX) + 1.0)
    }
}

/// Simulated Geiger tube emitting Poisson-distributed pulses.
///
/// Each pulse is reported as an edge; the line reads asserted exactly once
/// after the edge and deasserted afterwards, like a short TTL pulse.
pub struct SimulatedTube {
    mean_cpm: f64,
    rng: XorShift32,
    next_pulse: Instant,
    level_reads: Cell<u8>,
    pulses: u64,
}

impl SimulatedTube {
    pub fn new(mean_cpm: f64, seed: u32) -> Result<Self> {
        if !mean_cpm.is_finite() || mean_cpm < 0.0 {
            return Err(HwError::InvalidRate(mean_cpm));
        }
        let mut tube = Self {
            mean_cpm,
            rng: XorShift32::new(seed),
            next_pulse: Instant::now(),
            level_reads: Cell::new(u8::MAX),
            pulses: 0,
        };
        tube.schedule_from(Instant::now());
        Ok(tube)
    }

    /// Like `new`, but `GEIGER_SIM_CPM` takes precedence when set and parseable.
    pub fn from_env_or(mean_cpm: f64, seed: u32) -> Result<Self> {
        let cpm = std::env::var(SIM_CPM_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(mean_cpm);
        tracing::debug!(cpm, seed, "simulated tube");
        Self::new(cpm, seed)
    }

    pub fn mean_cpm(&self) -> f64 {
        self.mean_cpm
    }

    /// Total edges reported so far.
    pub fn pulses_emitted(&self) -> u64 {
        self.pulses
    }

    fn schedule_from(&mut self, from: Instant) {
        if self.mean_cpm <= 0.0 {
            return;
        }
        let mean_interval_s = 60.0 / self.mean_cpm;
        let dt = -self.rng.next_unit().ln() * mean_interval_s;
        self.next_pulse = from + Duration::from_secs_f64(dt.min(3_600.0));
    }
}

impl PulseLine for SimulatedTube {
    fn is_asserted(&self) -> bool {
        let reads = self.level_reads.get();
        self.level_reads.set(reads.saturating_add(1));
        reads == 0
    }
}

impl EdgeSource for SimulatedTube {
    fn wait_edge(&mut self, timeout: Duration) -> std::result::Result<bool, BoxError> {
        if self.mean_cpm <= 0.0 {
            std::thread::sleep(timeout);
            return Ok(false);
        }
        if !util::sleep_until_or_timeout(self.next_pulse, timeout) {
            return Ok(false);
        }
        self.level_reads.set(0);
        self.pulses = self.pulses.saturating_add(1);
        let fired_at = self.next_pulse;
        self.schedule_from(fired_at);
        tracing::trace!(pulses = self.pulses, "simulated pulse");
        Ok(true)
    }

    fn rearm(&mut self) -> std::result::Result<(), BoxError> {
        self.level_reads.set(u8::MAX);
        self.schedule_from(Instant::now());
        tracing::debug!("simulated tube re-armed");
        Ok(())
    }
}
