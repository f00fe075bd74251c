//! Collaborator seams for everything downstream of a sampling period.
//!
//! All sinks are best-effort: an `Err` is logged by the caller and the
//! reading is dropped. Implementations own their own timeouts.

use crate::BoxError;

/// One period's worth of telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    /// Wall-clock time of the sample, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub cpm: u32,
    pub dose_rate: f64,
    /// Output of the configured averaging strategy.
    pub average: f64,
    /// Optional (latitude, longitude) of the station.
    pub location: Option<(f64, f64)>,
}

/// Webhook-style alert body: rate and dose rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPayload {
    pub value1: String,
    pub value2: String,
}

pub trait TelemetrySink {
    fn publish(&mut self, telemetry: &Telemetry) -> Result<(), BoxError>;
}

pub trait AlertSink {
    fn notify(&mut self, alert: &AlertPayload) -> Result<(), BoxError>;
}

/// Board or enclosure temperature, read on demand from the console.
pub trait TemperatureProbe {
    fn celsius(&mut self) -> Result<f64, BoxError>;
}

pub trait DisplaySink {
    fn render(&mut self, telemetry: &Telemetry) -> Result<(), BoxError>;
}

/// Append-only per-period log (`timestamp,cpm,dose_rate`).
pub trait SampleLog {
    fn append(&mut self, timestamp_ms: u64, cpm: u32, dose_rate: f64) -> Result<(), BoxError>;
}
