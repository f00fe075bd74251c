//! Null collaborators for geiger_core: the defaults when no sink is wired.
use geiger_traits::{
    AlertPayload, AlertSink, BoxError, DisplaySink, SampleLog, Telemetry, TelemetrySink,
};

use crate::error::Result;
use crate::flags::{FlagSet, FlagStore};

pub struct NullTelemetry;

impl TelemetrySink for NullTelemetry {
    fn publish(&mut self, _telemetry: &Telemetry) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

pub struct NullAlerts;

impl AlertSink for NullAlerts {
    fn notify(&mut self, _alert: &AlertPayload) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn render(&mut self, _telemetry: &Telemetry) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

pub struct NullLog;

impl SampleLog for NullLog {
    fn append(
        &mut self,
        _timestamp_ms: u64,
        _cpm: u32,
        _dose_rate: f64,
    ) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

/// Keeps flags in memory only.
pub struct NullFlagStore;

impl FlagStore for NullFlagStore {
    fn persist(&mut self, _flags: &FlagSet) -> Result<()> {
        Ok(())
    }
}
