//! The per-period pipeline and the query surface.
//!
//! `Monitor` owns everything the main loop touches: sampler, converter,
//! history, averager, alert dispatcher, health monitor, flags and sinks.
//! The only state it shares with the acquisition thread is the
//! `PulseHandler`.
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use geiger_traits::clock::Clock;
use geiger_traits::{DisplaySink, SampleLog, Telemetry, TelemetrySink, TemperatureProbe};

use crate::acquisition::{AcquisitionStats, PulseHandler};
use crate::alert::{AlertDispatcher, AlertOutcome, exceeds};
use crate::averager::{Averager, Averages};
use crate::builder::MonitorBuilder;
use crate::console::{Command, HELP};
use crate::dose::{DoseConverter, DoseRate};
use crate::flags::{Flag, FlagSet, Flags};
use crate::health::HealthMonitor;
use crate::history::HistoryBuffer;
use crate::hw_error::map_sink_error;
use crate::sampler::{RateSample, RateSampler};
use crate::util::unix_time_ms;

/// Everything one sampling period produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Wall-clock time of the sample, ms since the Unix epoch.
    pub timestamp_ms: u64,
    pub sample: RateSample,
    pub dose: DoseRate,
    pub averages: Averages,
    pub alert: AlertOutcome,
    /// The health monitor forced a re-arm this period.
    pub rearmed: bool,
}

impl Reading {
    pub fn telemetry(&self, location: Option<(f64, f64)>) -> Telemetry {
        Telemetry {
            timestamp_ms: self.timestamp_ms,
            cpm: self.sample.cpm_whole(),
            dose_rate: self.dose.value(),
            average: self.averages.selected,
            location,
        }
    }
}

/// Point-in-time view for console queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Last sampled CPM (0 before the first period).
    pub cpm: f64,
    pub dose_rate: DoseRate,
    /// Output of the configured averaging strategy.
    pub average: f64,
    pub simple_mean: f64,
    pub filtered: f64,
    /// Most recent first.
    pub history: Vec<f64>,
    pub threshold_cpm: u32,
    pub above_threshold: bool,
    /// Pulses counted in the open window.
    pub pending: u32,
    pub armed: bool,
    pub acquisition: AcquisitionStats,
    pub periods: u64,
    pub rearms: u64,
    pub flags: FlagSet,
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "cpm={:.0} dose={:.4} avg={:.2} (mean={:.2} filtered={:.2})",
            self.cpm, self.dose_rate, self.average, self.simple_mean, self.filtered
        )?;
        writeln!(
            f,
            "threshold={} {}",
            self.threshold_cpm,
            if self.above_threshold { "EXCEEDED" } else { "ok" }
        )?;
        writeln!(
            f,
            "periods={} pending={} armed={} accepted={} bounces={} spin_failures={} rearms={}",
            self.periods,
            self.pending,
            self.armed,
            self.acquisition.accepted,
            self.acquisition.bounces,
            self.acquisition.spin_failures,
            self.rearms
        )?;
        write!(
            f,
            "debug={} network={} file={} display={}",
            on_off(self.flags.debug),
            on_off(self.flags.network),
            on_off(self.flags.file_logging),
            on_off(self.flags.display)
        )
    }
}

pub struct Monitor {
    pub(crate) handler: Arc<PulseHandler>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) sampler: RateSampler,
    pub(crate) converter: DoseConverter,
    pub(crate) history: HistoryBuffer,
    pub(crate) averager: Averager,
    pub(crate) alerts: AlertDispatcher,
    pub(crate) health: HealthMonitor,
    pub(crate) flags: Flags,
    pub(crate) telemetry: Box<dyn TelemetrySink + Send>,
    pub(crate) display: Box<dyn DisplaySink + Send>,
    pub(crate) log: Box<dyn SampleLog + Send>,
    pub(crate) temperature: Option<Box<dyn TemperatureProbe + Send>>,
    pub(crate) location: Option<(f64, f64)>,
    pub(crate) poll_interval: Duration,
    pub(crate) edge_timeout: Duration,
    pub(crate) last: Option<Reading>,
    pub(crate) periods: u64,
    pub(crate) late_periods: u64,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("window_ms", &self.sampler.window_ms())
            .field("periods", &self.periods)
            .field("flags", &self.flags.current())
            .field("handler", &self.handler)
            .finish()
    }
}

impl Monitor {
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::default()
    }

    /// Edge handler to hand to the acquisition context.
    pub fn handler(&self) -> Arc<PulseHandler> {
        Arc::clone(&self.handler)
    }

    /// Main loop idle sleep.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait bound for the acquisition thread.
    pub fn edge_timeout(&self) -> Duration {
        self.edge_timeout
    }

    pub fn flags(&self) -> FlagSet {
        self.flags.current()
    }

    pub fn periods(&self) -> u64 {
        self.periods
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn last_reading(&self) -> Option<&Reading> {
        self.last.as_ref()
    }

    pub fn alerts(&self) -> &AlertDispatcher {
        &self.alerts
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// Periods whose window ran more than one poll interval past its length.
    pub fn late_periods(&self) -> u64 {
        self.late_periods
    }

    fn poll_interval_ms(&self) -> u64 {
        u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX)
    }

    fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Sleep on the monitor's clock.
    pub fn idle(&self, d: Duration) {
        self.clock.sleep(d);
    }

    /// Milliseconds until the open window closes.
    pub fn remaining_ms(&self) -> u64 {
        self.sampler.remaining_ms(self.now_ms())
    }

    /// One loop iteration: re-arm the debounce gate if its dead time is up,
    /// then close the window if it is due.
    pub fn poll(&mut self) -> Option<Reading> {
        if self.handler.poll_rearm() {
            tracing::trace!("debounce gate re-armed");
        }
        let now = self.now_ms();
        if !self.sampler.due(now) {
            return None;
        }
        Some(self.close_period(now))
    }

    /// Close the open window now, regardless of elapsed time.
    pub fn sample_period(&mut self) -> Reading {
        let now = self.now_ms();
        self.close_period(now)
    }

    fn close_period(&mut self, now_ms: u64) -> Reading {
        let sample = self.sampler.sample_period(&self.handler, now_ms);
        let overrun_ms = sample.window.overrun_ms();
        if overrun_ms > self.poll_interval_ms() {
            self.late_periods = self.late_periods.saturating_add(1);
            tracing::warn!(
                window_ms = sample.window.duration_ms.get(),
                elapsed_ms = sample.window.elapsed_ms,
                counts = sample.counts,
                "sampling window closed late; rate is overstated"
            );
        }
        let dose = self.converter.to_dose_rate(sample.cpm);

        // Health compares against the head as it was before this push.
        let previous_head = (!self.history.is_empty()).then(|| self.history.head());
        self.history.push(sample.cpm);
        let averages = self.averager.update(&self.history, sample.cpm);

        let flags = self.flags.current();
        let alert = self.alerts.evaluate(sample.cpm, dose, flags.network);

        let rearmed = self.health.check_stuck(sample.cpm, previous_head);
        if rearmed {
            tracing::warn!(
                window_ms = sample.window.duration_ms.get(),
                "no pulses for two periods; forcing acquisition re-arm"
            );
            self.handler.force_rearm();
        }

        let reading = Reading {
            timestamp_ms: unix_time_ms(),
            sample,
            dose,
            averages,
            alert,
            rearmed,
        };
        self.periods = self.periods.saturating_add(1);

        if flags.debug {
            tracing::info!(
                cpm = sample.cpm,
                counts = sample.counts,
                dose = dose.value(),
                average = averages.selected,
                "period"
            );
        } else {
            tracing::debug!(
                cpm = sample.cpm,
                counts = sample.counts,
                dose = dose.value(),
                average = averages.selected,
                "period"
            );
        }

        self.forward(&reading, flags);
        self.last = Some(reading.clone());
        reading
    }

    /// Hand one reading to every enabled sink. Failures are logged and dropped.
    fn forward(&mut self, reading: &Reading, flags: FlagSet) {
        let telemetry = reading.telemetry(self.location);
        if flags.network
            && let Err(e) = self.telemetry.publish(&telemetry)
        {
            let err = map_sink_error(e.as_ref());
            tracing::warn!(error = %err, "telemetry dropped");
        }
        if flags.display
            && let Err(e) = self.display.render(&telemetry)
        {
            let err = map_sink_error(e.as_ref());
            tracing::warn!(error = %err, "display update failed");
        }
        if flags.file_logging
            && let Err(e) = self
                .log
                .append(telemetry.timestamp_ms, telemetry.cpm, telemetry.dose_rate)
        {
            let err = map_sink_error(e.as_ref());
            tracing::warn!(error = %err, "sample log append failed");
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let cpm = self.last.as_ref().map_or(0.0, |r| r.sample.cpm);
        let averages = self.averager.peek(&self.history);
        Snapshot {
            cpm,
            dose_rate: self.converter.to_dose_rate(cpm),
            average: averages.selected,
            simple_mean: averages.simple,
            filtered: averages.weighted,
            history: self.history.values(),
            threshold_cpm: self.alerts.threshold(),
            above_threshold: exceeds(cpm, self.alerts.threshold()),
            pending: self.handler.pending(),
            armed: self.handler.is_armed(),
            acquisition: self.handler.stats(),
            periods: self.periods,
            rearms: self.health.rearms(),
            flags: self.flags.current(),
        }
    }

    /// Change a flag (persisted through the flag store).
    pub fn set_flag(&mut self, flag: Flag, value: bool) -> bool {
        self.flags.update(flag, value)
    }

    /// Drop history, filter and stall state and start a fresh window.
    /// Pulses counted in the open window are discarded.
    pub fn restart(&mut self) {
        let dropped = self.handler.drain();
        self.history.clear();
        self.averager.reset();
        self.health.reset();
        self.last = None;
        self.late_periods = 0;
        let now = self.now_ms();
        self.sampler.restart(now);
        tracing::info!(dropped, "monitor restarted");
    }

    fn temperature_reply(&mut self) -> String {
        let Some(probe) = self.temperature.as_mut() else {
            return "temperature: unavailable".to_string();
        };
        match probe.celsius() {
            Ok(c) => format!("temperature: {c:.1} C"),
            Err(e) => {
                tracing::warn!(error = %e, "temperature read failed");
                "temperature: unavailable".to_string()
            }
        }
    }

    /// Execute a console command and return the text reply.
    pub fn apply(&mut self, command: &Command) -> String {
        match command {
            Command::Toggle(flag) => {
                let value = self.flags.toggle(*flag);
                format!("{}: {}", flag.name(), on_off(value))
            }
            Command::Status => self.snapshot().to_string(),
            Command::History => {
                let list: Vec<String> = self
                    .history
                    .values()
                    .iter()
                    .map(|v| format!("{v:.0}"))
                    .collect();
                format!("history: [{}]", list.join(", "))
            }
            Command::Temperature => self.temperature_reply(),
            Command::Restart => {
                self.restart();
                "restarted".to_string()
            }
            Command::Rearm => {
                self.handler.force_rearm();
                "re-arm requested".to_string()
            }
            Command::Help => HELP.to_string(),
            Command::Unknown(token) => format!("unknown command '{token}'\n{HELP}"),
        }
    }
}
