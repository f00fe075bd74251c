//! Runtime configuration for the monitor.
//!
//! These are the structs `MonitorBuilder` validates and consumes. They are
//! separate from the TOML-deserialized config in `geiger_config`; see
//! `conversions` for the bridge.
use crate::averager::AverageKind;
use crate::dose::DEFAULT_TUBE_FACTOR;
use crate::history::EmptyPolicy;
use crate::sampler::RateMath;

/// Sampling period and loop pacing.
#[derive(Debug, Clone)]
pub struct SamplingCfg {
    /// Counting window length in ms. Must be > 0.
    pub window_ms: u64,
    pub rate_math: RateMath,
    /// Idle sleep of the main loop between polls (ms, >= 1).
    pub poll_ms: u64,
    /// Upper bound on one edge wait in the acquisition thread (ms, >= 1).
    pub edge_timeout_ms: u64,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            rate_math: RateMath::Truncate,
            poll_ms: 10,
            edge_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryCfg {
    /// Number of periods kept, >= 1.
    pub capacity: usize,
    pub policy: EmptyPolicy,
}

impl Default for HistoryCfg {
    fn default() -> Self {
        Self {
            capacity: 5,
            policy: EmptyPolicy::ZeroIsEmpty,
        }
    }
}

/// Averaging selection and exponential filter weight.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    /// Weight of the newest sample; open interval (0.0, 1.0).
    pub weight: f64,
    pub average: AverageKind,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            weight: 0.8,
            average: AverageKind::Simple,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TubeCfg {
    /// Dose rate per CPM.
    pub factor: f64,
}

impl Default for TubeCfg {
    fn default() -> Self {
        Self {
            factor: DEFAULT_TUBE_FACTOR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertCfg {
    pub threshold_cpm: u32,
}

impl Default for AlertCfg {
    fn default() -> Self {
        Self { threshold_cpm: 100 }
    }
}

/// Static fields attached to every telemetry record.
#[derive(Debug, Clone, Default)]
pub struct TelemetryCfg {
    /// (latitude, longitude) in degrees.
    pub location: Option<(f64, f64)>,
}
