//! `From` implementations bridging `geiger_config` types to `geiger_core` types.

use crate::averager::AverageKind;
use crate::config::{AlertCfg, FilterCfg, HistoryCfg, SamplingCfg, TelemetryCfg, TubeCfg};
use crate::debounce::DebounceCfg;
use crate::flags::FlagSet;
use crate::history::EmptyPolicy;
use crate::sampler::RateMath;

// ── Enums ────────────────────────────────────────────────────────────────────

impl From<geiger_config::RateMath> for RateMath {
    fn from(m: geiger_config::RateMath) -> Self {
        match m {
            geiger_config::RateMath::Truncate => RateMath::Truncate,
            geiger_config::RateMath::Float => RateMath::Float,
        }
    }
}

impl From<geiger_config::Average> for AverageKind {
    fn from(a: geiger_config::Average) -> Self {
        match a {
            geiger_config::Average::Simple => AverageKind::Simple,
            geiger_config::Average::Weighted => AverageKind::Weighted,
        }
    }
}

// ── Sections ─────────────────────────────────────────────────────────────────

impl From<&geiger_config::Sampling> for SamplingCfg {
    fn from(c: &geiger_config::Sampling) -> Self {
        Self {
            window_ms: c.window_ms,
            rate_math: c.rate_math.into(),
            poll_ms: c.poll_ms,
            edge_timeout_ms: c.edge_timeout_ms,
        }
    }
}

impl From<&geiger_config::Debounce> for DebounceCfg {
    fn from(c: &geiger_config::Debounce) -> Self {
        Self {
            verify_level: c.verify_level,
            max_spin_iters: c.max_spin_iters,
            dead_time_ms: c.dead_time_ms,
        }
    }
}

impl From<&geiger_config::History> for HistoryCfg {
    fn from(c: &geiger_config::History) -> Self {
        Self {
            capacity: c.capacity,
            policy: if c.zero_is_empty {
                EmptyPolicy::ZeroIsEmpty
            } else {
                EmptyPolicy::TrackFilled
            },
        }
    }
}

impl From<&geiger_config::Filter> for FilterCfg {
    fn from(c: &geiger_config::Filter) -> Self {
        Self {
            weight: c.weight,
            average: c.average.into(),
        }
    }
}

impl From<&geiger_config::Tube> for TubeCfg {
    fn from(c: &geiger_config::Tube) -> Self {
        Self { factor: c.factor }
    }
}

impl From<&geiger_config::Alert> for AlertCfg {
    fn from(c: &geiger_config::Alert) -> Self {
        Self {
            threshold_cpm: c.threshold_cpm,
        }
    }
}

impl From<&geiger_config::TelemetryCfg> for TelemetryCfg {
    fn from(c: &geiger_config::TelemetryCfg) -> Self {
        Self {
            location: c.location(),
        }
    }
}

// ── Flags ────────────────────────────────────────────────────────────────────

impl From<geiger_config::PersistedFlags> for FlagSet {
    fn from(p: geiger_config::PersistedFlags) -> Self {
        Self {
            debug: p.debug,
            network: p.network,
            file_logging: p.file_logging,
            display: p.display,
        }
    }
}

impl From<FlagSet> for geiger_config::PersistedFlags {
    fn from(f: FlagSet) -> Self {
        Self {
            debug: f.debug,
            network: f.network,
            file_logging: f.file_logging,
            display: f.display,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_empty_flag_selects_policy() {
        let mut h = geiger_config::History::default();
        assert_eq!(HistoryCfg::from(&h).policy, EmptyPolicy::ZeroIsEmpty);
        h.zero_is_empty = false;
        assert_eq!(HistoryCfg::from(&h).policy, EmptyPolicy::TrackFilled);
    }

    #[test]
    fn default_sections_match_runtime_defaults() {
        let cfg = geiger_config::Config::default();
        let s = SamplingCfg::from(&cfg.sampling);
        let d = SamplingCfg::default();
        assert_eq!(s.window_ms, d.window_ms);
        assert_eq!(s.rate_math, d.rate_math);
        assert_eq!(FilterCfg::from(&cfg.filter).weight, FilterCfg::default().weight);
        assert_eq!(TubeCfg::from(&cfg.tube).factor, TubeCfg::default().factor);
        assert_eq!(DebounceCfg::from(&cfg.debounce), DebounceCfg::default());
        assert_eq!(FlagSet::from(geiger_config::PersistedFlags::default()), FlagSet::default());
    }
}
