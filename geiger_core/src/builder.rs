//! Builder for `Monitor`.
//!
//! Every piece is optional: missing configuration falls back to defaults,
//! missing sinks to the null sinks in `mocks`. All range checks happen in
//! `validate_and_build`, before any sampling can start.

use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use geiger_traits::clock::{Clock, MonotonicClock};
use geiger_traits::{AlertSink, DisplaySink, SampleLog, TelemetrySink, TemperatureProbe};

use crate::acquisition::PulseHandler;
use crate::alert::AlertDispatcher;
use crate::averager::{Averager, Weight};
use crate::config::*;
use crate::debounce::DebounceCfg;
use crate::dose::DoseConverter;
use crate::error::{BuildError, Result};
use crate::flags::{FileFlagStore, FlagSet, FlagStore, Flags};
use crate::health::HealthMonitor;
use crate::history::HistoryBuffer;
use crate::mocks::{NullAlerts, NullDisplay, NullFlagStore, NullLog, NullTelemetry};
use crate::monitor::Monitor;
use crate::sampler::RateSampler;

#[derive(Default)]
pub struct MonitorBuilder {
    sampling: Option<SamplingCfg>,
    debounce: Option<DebounceCfg>,
    history: Option<HistoryCfg>,
    filter: Option<FilterCfg>,
    tube: Option<TubeCfg>,
    alert: Option<AlertCfg>,
    telemetry: Option<TelemetryCfg>,
    flags: Option<(FlagSet, Box<dyn FlagStore + Send>)>,
    telemetry_sink: Option<Box<dyn TelemetrySink + Send>>,
    alert_sink: Option<Box<dyn AlertSink + Send>>,
    display_sink: Option<Box<dyn DisplaySink + Send>>,
    sample_log: Option<Box<dyn SampleLog + Send>>,
    temperature: Option<Box<dyn TemperatureProbe + Send>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Validate configuration and assemble the monitor.
#[allow(clippy::too_many_arguments)]
fn validate_and_build(
    sampling: SamplingCfg,
    debounce: DebounceCfg,
    history: HistoryCfg,
    filter: FilterCfg,
    tube: TubeCfg,
    alert: AlertCfg,
    telemetry: TelemetryCfg,
    flags: Flags,
    sinks: Sinks,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<Monitor> {
    // ── Validation ───────────────────────────────────────────────────────────
    let window_ms =
        NonZeroU64::new(sampling.window_ms).ok_or_else(|| invalid("window_ms must be > 0"))?;
    if sampling.poll_ms == 0 {
        return Err(invalid("poll_ms must be >= 1"));
    }
    if sampling.edge_timeout_ms == 0 {
        return Err(invalid("edge_timeout_ms must be >= 1"));
    }
    if history.capacity == 0 {
        return Err(invalid("history capacity must be >= 1"));
    }
    let weight = Weight::new(filter.weight)?;
    if !tube.factor.is_finite() || tube.factor <= 0.0 {
        return Err(invalid("tube factor must be finite and > 0"));
    }
    if let Some((lat, lon)) = telemetry.location
        && (!(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon))
    {
        return Err(invalid("location out of range"));
    }

    // ── Assemble ─────────────────────────────────────────────────────────────
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let epoch = clock.now();
    let now = clock.ms_since(epoch);

    let handler = Arc::new(PulseHandler::new(debounce, Arc::clone(&clock), epoch));

    tracing::info!(
        window_ms = window_ms.get(),
        threshold_cpm = alert.threshold_cpm,
        capacity = history.capacity,
        average = ?filter.average,
        "monitor configured"
    );

    Ok(Monitor {
        handler,
        clock,
        epoch,
        sampler: RateSampler::new(window_ms, sampling.rate_math, now),
        converter: DoseConverter::new(tube.factor),
        history: HistoryBuffer::new(history.capacity, history.policy),
        averager: Averager::new(filter.average, weight),
        alerts: AlertDispatcher::new(alert.threshold_cpm, sinks.alert),
        health: HealthMonitor::new(),
        flags,
        telemetry: sinks.telemetry,
        display: sinks.display,
        log: sinks.log,
        temperature: sinks.temperature,
        location: telemetry.location,
        poll_interval: Duration::from_millis(sampling.poll_ms),
        edge_timeout: Duration::from_millis(sampling.edge_timeout_ms),
        last: None,
        periods: 0,
        late_periods: 0,
    })
}

struct Sinks {
    telemetry: Box<dyn TelemetrySink + Send>,
    alert: Box<dyn AlertSink + Send>,
    display: Box<dyn DisplaySink + Send>,
    log: Box<dyn SampleLog + Send>,
    temperature: Option<Box<dyn TemperatureProbe + Send>>,
}

impl MonitorBuilder {
    /// Validate and build the monitor.
    pub fn build(self) -> Result<Monitor> {
        let (initial, store) = match self.flags {
            Some(pair) => pair,
            None => (
                FlagSet::default(),
                Box::new(NullFlagStore) as Box<dyn FlagStore + Send>,
            ),
        };
        let sinks = Sinks {
            telemetry: self.telemetry_sink.unwrap_or_else(|| Box::new(NullTelemetry)),
            alert: self.alert_sink.unwrap_or_else(|| Box::new(NullAlerts)),
            display: self.display_sink.unwrap_or_else(|| Box::new(NullDisplay)),
            log: self.sample_log.unwrap_or_else(|| Box::new(NullLog)),
            temperature: self.temperature,
        };
        validate_and_build(
            self.sampling.unwrap_or_default(),
            self.debounce.unwrap_or_default(),
            self.history.unwrap_or_default(),
            self.filter.unwrap_or_default(),
            self.tube.unwrap_or_default(),
            self.alert.unwrap_or_default(),
            self.telemetry.unwrap_or_default(),
            Flags::new(initial, store),
            sinks,
            self.clock,
        )
    }

    /// Take every section from a loaded TOML config. The flag file named
    /// in `[flags]` is read now and becomes the flag store.
    pub fn with_config(self, cfg: &geiger_config::Config) -> Result<Self> {
        let store = FileFlagStore::new(&cfg.flags.path);
        let initial = store.load()?;
        Ok(self
            .with_sampling((&cfg.sampling).into())
            .with_debounce((&cfg.debounce).into())
            .with_history((&cfg.history).into())
            .with_filter((&cfg.filter).into())
            .with_tube((&cfg.tube).into())
            .with_alert((&cfg.alert).into())
            .with_telemetry((&cfg.telemetry).into())
            .with_flags(initial, Box::new(store)))
    }

    pub fn with_sampling(mut self, sampling: SamplingCfg) -> Self {
        self.sampling = Some(sampling);
        self
    }
    pub fn with_debounce(mut self, debounce: DebounceCfg) -> Self {
        self.debounce = Some(debounce);
        self
    }
    pub fn with_history(mut self, history: HistoryCfg) -> Self {
        self.history = Some(history);
        self
    }
    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }
    pub fn with_tube(mut self, tube: TubeCfg) -> Self {
        self.tube = Some(tube);
        self
    }
    pub fn with_alert(mut self, alert: AlertCfg) -> Self {
        self.alert = Some(alert);
        self
    }
    pub fn with_telemetry(mut self, telemetry: TelemetryCfg) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
    pub fn with_location(mut self, location: Option<(f64, f64)>) -> Self {
        self.telemetry = Some(TelemetryCfg { location });
        self
    }
    /// Initial flag values and where changes are persisted.
    pub fn with_flags(mut self, initial: FlagSet, store: Box<dyn FlagStore + Send>) -> Self {
        self.flags = Some((initial, store));
        self
    }
    pub fn with_telemetry_sink(mut self, sink: Box<dyn TelemetrySink + Send>) -> Self {
        self.telemetry_sink = Some(sink);
        self
    }
    pub fn with_alert_sink(mut self, sink: Box<dyn AlertSink + Send>) -> Self {
        self.alert_sink = Some(sink);
        self
    }
    pub fn with_display_sink(mut self, sink: Box<dyn DisplaySink + Send>) -> Self {
        self.display_sink = Some(sink);
        self
    }
    pub fn with_sample_log(mut self, log: Box<dyn SampleLog + Send>) -> Self {
        self.sample_log = Some(log);
        self
    }
    /// Probe answering the `temperature` console command.
    pub fn with_temperature_probe(mut self, probe: Box<dyn TemperatureProbe + Send>) -> Self {
        self.temperature = Some(probe);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}
