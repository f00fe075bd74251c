#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and persisted flags for the Geiger monitor.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `PersistedFlags` is the small durable flag file toggled from the console.
use serde::{Deserialize, Serialize};

pub mod atomic;

/// Default SBM-20 conversion factor (uSv/h per count-per-minute).
pub const DEFAULT_TUBE_FACTOR: f64 = 0.008_120_370_370_37;

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Rising,
    #[default]
    Falling,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    /// BCM pin number wired to the tube interface output
    pub pulse_in: u8,
    /// Which transition marks a pulse
    pub edge: Edge,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            pulse_in: 17,
            edge: Edge::Falling,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RateMath {
    /// counts * 60000 / window_ms in integer arithmetic
    #[default]
    Truncate,
    Float,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sampling {
    /// Length of one counting window (ms)
    pub window_ms: u64,
    pub rate_math: RateMath,
    /// Idle sleep of the main loop between polls (ms)
    pub poll_ms: u64,
    /// How long the acquisition thread blocks waiting for one edge (ms)
    pub edge_timeout_ms: u64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            rate_math: RateMath::Truncate,
            poll_ms: 10,
            edge_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Debounce {
    /// Reject an edge when the line is no longer asserted on entry
    pub verify_level: bool,
    /// Upper bound on polls while waiting for the line to deassert (0 disables the wait)
    pub max_spin_iters: u32,
    /// Ignore further edges for this long after an accepted pulse (0 disables)
    pub dead_time_ms: u64,
}

impl Default for Debounce {
    fn default() -> Self {
        Self {
            verify_level: true,
            max_spin_iters: 10_000,
            dead_time_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Tube {
    /// Dose rate per count-per-minute
    pub factor: f64,
}

impl Default for Tube {
    fn default() -> Self {
        Self {
            factor: DEFAULT_TUBE_FACTOR,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct History {
    pub capacity: usize,
    /// Treat a zero slot as "not yet filled" when averaging
    pub zero_is_empty: bool,
}

impl Default for History {
    fn default() -> Self {
        Self {
            capacity: 5,
            zero_is_empty: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Average {
    #[default]
    Simple,
    Weighted,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Filter {
    /// Weight of the newest sample in the exponential filter, in (0.0, 1.0)
    pub weight: f64,
    /// Which average feeds telemetry and display
    pub average: Average,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            weight: 0.8,
            average: Average::Simple,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Alert {
    /// Fire when the sampled CPM strictly exceeds this value
    pub threshold_cpm: u32,
}

impl Default for Alert {
    fn default() -> Self {
        Self { threshold_cpm: 100 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TelemetryCfg {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TelemetryCfg {
    /// Station location when both coordinates are present.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sinks {
    /// JSON lines telemetry output; stdout when absent
    pub telemetry_path: Option<String>,
    /// JSON lines alert output; stdout when absent
    pub alert_path: Option<String>,
    /// CSV append log (timestamp,cpm,dose_rate)
    pub log_path: String,
}

impl Default for Sinks {
    fn default() -> Self {
        Self {
            telemetry_path: None,
            alert_path: None,
            log_path: "geiger_log.csv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FlagsCfg {
    pub path: String,
}

impl Default for FlagsCfg {
    fn default() -> Self {
        Self {
            path: "geiger_flags.toml".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub sampling: Sampling,
    pub debounce: Debounce,
    pub tube: Tube,
    pub history: History,
    pub filter: Filter,
    pub alert: Alert,
    pub telemetry: TelemetryCfg,
    pub sinks: Sinks,
    pub flags: FlagsCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sampling
        if self.sampling.window_ms == 0 {
            eyre::bail!("sampling.window_ms must be > 0");
        }
        if self.sampling.window_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("sampling.window_ms is unreasonably large (>24h)");
        }
        if self.sampling.poll_ms == 0 {
            eyre::bail!("sampling.poll_ms must be >= 1");
        }
        if self.sampling.poll_ms > self.sampling.window_ms {
            eyre::bail!("sampling.poll_ms must not exceed sampling.window_ms");
        }
        if self.sampling.edge_timeout_ms == 0 {
            eyre::bail!("sampling.edge_timeout_ms must be >= 1");
        }

        // Tube
        if !(self.tube.factor.is_finite() && self.tube.factor > 0.0) {
            eyre::bail!("tube.factor must be a finite value > 0.0");
        }

        // History
        if self.history.capacity == 0 {
            eyre::bail!("history.capacity must be >= 1");
        }
        if self.history.capacity > 10_000 {
            eyre::bail!("history.capacity is unreasonably large (>10000)");
        }

        // Filter: inclusive bounds are a configuration error
        let w = self.filter.weight;
        if !(w > 0.0 && w < 1.0) {
            eyre::bail!("filter.weight must be in (0.0, 1.0)");
        }

        // Telemetry
        if self.telemetry.latitude.is_some() != self.telemetry.longitude.is_some() {
            eyre::bail!("telemetry.latitude and telemetry.longitude must be set together");
        }
        if let Some(lat) = self.telemetry.latitude
            && !(-90.0..=90.0).contains(&lat)
        {
            eyre::bail!("telemetry.latitude must be in [-90, 90]");
        }
        if let Some(lon) = self.telemetry.longitude
            && !(-180.0..=180.0).contains(&lon)
        {
            eyre::bail!("telemetry.longitude must be in [-180, 180]");
        }

        // Sinks
        if self.sinks.log_path.trim().is_empty() {
            eyre::bail!("sinks.log_path must not be empty");
        }
        if self.flags.path.trim().is_empty() {
            eyre::bail!("flags.path must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Durable on/off switches toggled from the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedFlags {
    pub debug: bool,
    pub network: bool,
    pub file_logging: bool,
    pub display: bool,
}

impl Default for PersistedFlags {
    fn default() -> Self {
        Self {
            debug: false,
            network: false,
            file_logging: true,
            display: true,
        }
    }
}

/// Read the flag file; a missing file yields the defaults.
pub fn load_flags(path: &std::path::Path) -> eyre::Result<PersistedFlags> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(PersistedFlags::default());
        }
        Err(e) => eyre::bail!("read flags file {:?}: {}", path, e),
    };
    toml::from_str::<PersistedFlags>(&text)
        .map_err(|e| eyre::eyre!("parse flags file {:?}: {}", path, e))
}

/// Rewrite the flag file atomically.
pub fn save_flags(path: &std::path::Path, flags: &PersistedFlags) -> eyre::Result<()> {
    let text = toml::to_string(flags).map_err(|e| eyre::eyre!("encode flags: {}", e))?;
    atomic::write_atomic(path, text.as_bytes())
        .map_err(|e| eyre::eyre!("write flags file {:?}: {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_toml("").unwrap();
        assert_eq!(cfg.sampling.window_ms, 60_000);
        assert_eq!(cfg.history.capacity, 5);
        assert_eq!(cfg.pins.edge, Edge::Falling);
        assert!((cfg.tube.factor - DEFAULT_TUBE_FACTOR).abs() < 1e-15);
        cfg.validate().unwrap();
    }

    #[test]
    fn location_requires_both_coordinates() {
        let t = TelemetryCfg {
            latitude: Some(1.0),
            longitude: None,
        };
        assert_eq!(t.location(), None);
        let t = TelemetryCfg {
            latitude: Some(1.0),
            longitude: Some(2.0),
        };
        assert_eq!(t.location(), Some((1.0, 2.0)));
    }
}
