//! Subcommand bodies: `run`, `self-check` and `flags`.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use geiger_config::Config;
use geiger_core::error::GeigerError;
use geiger_core::runner::{self, RunEvent, RunLimits};
use geiger_core::{Acquisition, FileFlagStore, Flag, FlagStore, Monitor, MonitorBuilder};
use geiger_hardware::thermal::ThermalZone;
use geiger_traits::EdgeSource;

use crate::sinks::{CsvSampleLog, JsonAlerts, JsonTelemetry, TerminalDisplay, open_output};

/// Mean rate of the simulated tube when `GEIGER_SIM_CPM` is unset.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
const SIM_DEFAULT_CPM: f64 = 20.0;

fn io_err(what: &str, e: std::io::Error) -> eyre::Report {
    eyre::Report::new(GeigerError::Io(format!("{what}: {e}")))
}

/// Builder with every section of `cfg` and the file/stdout sinks attached.
fn monitor_builder(cfg: &Config) -> eyre::Result<MonitorBuilder> {
    let telemetry = open_output(cfg.sinks.telemetry_path.as_deref())
        .map_err(|e| io_err("open telemetry output", e))?;
    let alerts =
        open_output(cfg.sinks.alert_path.as_deref()).map_err(|e| io_err("open alert output", e))?;
    let mut builder = Monitor::builder()
        .with_config(cfg)?
        .with_telemetry_sink(Box::new(JsonTelemetry::new(telemetry)))
        .with_alert_sink(Box::new(JsonAlerts::new(alerts)))
        .with_sample_log(Box::new(CsvSampleLog::new(&cfg.sinks.log_path)))
        .with_display_sink(Box::new(TerminalDisplay::stdout()));
    if let Some(zone) = ThermalZone::detect() {
        builder = builder.with_temperature_probe(Box::new(zone));
    }
    Ok(builder)
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn spawn_acquisition(cfg: &Config, monitor: &Monitor) -> eyre::Result<Acquisition> {
    let edge = match cfg.pins.edge {
        geiger_config::Edge::Rising => geiger_hardware::PulseEdge::Rising,
        geiger_config::Edge::Falling => geiger_hardware::PulseEdge::Falling,
    };
    let input = geiger_hardware::gpio::GpioPulseInput::new(cfg.pins.pulse_in, edge)?;
    tracing::info!(pin = cfg.pins.pulse_in, ?edge, "using GPIO pulse input");
    start(input, monitor)
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn spawn_acquisition(_cfg: &Config, monitor: &Monitor) -> eyre::Result<Acquisition> {
    // Truncation is fine for a seed
    let seed = geiger_core::util::unix_time_ms() as u32;
    let tube = geiger_hardware::SimulatedTube::from_env_or(SIM_DEFAULT_CPM, seed)?;
    tracing::info!(cpm = tube.mean_cpm(), "using simulated tube");
    start(tube, monitor)
}

fn start<E: EdgeSource + Send + 'static>(
    source: E,
    monitor: &Monitor,
) -> eyre::Result<Acquisition> {
    Acquisition::spawn(source, monitor.handler(), monitor.edge_timeout())
        .map_err(|e| io_err("spawn acquisition thread", e))
}

pub fn run(cfg: &Config, periods: Option<u64>, no_console: bool, json: bool) -> eyre::Result<()> {
    let mut monitor = monitor_builder(cfg)?.build()?;
    let acquisition = spawn_acquisition(cfg, &monitor)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    if !no_console {
        let stdin = std::io::BufReader::new(std::io::stdin());
        geiger_core::console::spawn_line_reader("stdin", stdin, tx)
            .map_err(|e| io_err("spawn console reader", e))?;
    } else {
        drop(tx);
    }

    let limits = RunLimits {
        max_periods: periods,
    };
    let summary = runner::run(
        &mut monitor,
        Some(&acquisition),
        &rx,
        &shutdown,
        limits,
        |event| {
            if let RunEvent::Reply(_, text) = event {
                println!("{text}");
            }
        },
    )?;
    drop(acquisition);

    if json {
        let v = serde_json::json!({
            "periods": summary.periods,
            "alerts_fired": summary.alerts_fired,
            "rearms": summary.rearms,
            "commands": summary.commands,
        });
        println!("{v}");
    } else {
        println!(
            "run complete: {} periods, {} alerts, {} re-arms",
            summary.periods, summary.alerts_fired, summary.rearms
        );
    }
    Ok(())
}

/// Build the monitor and open the pulse input once, without counting.
pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let monitor = monitor_builder(cfg)?.build()?;
    let acquisition = spawn_acquisition(cfg, &monitor)?;
    drop(acquisition);
    tracing::info!("self-check passed");
    println!("self-check ok");
    Ok(())
}

fn parse_switch(value: &str) -> eyre::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => Err(eyre::Report::new(GeigerError::Config(format!(
            "flag value must be on or off, got '{other}'"
        )))),
    }
}

/// Print the persisted flags, one flag, or set one and persist it.
pub fn flags(cfg: &Config, name: Option<&str>, value: Option<&str>) -> eyre::Result<()> {
    let store = FileFlagStore::new(&cfg.flags.path);
    let current = store.load()?;

    let Some(name) = name else {
        let persisted: geiger_config::PersistedFlags = current.into();
        let text = toml::to_string(&persisted)
            .map_err(|e| GeigerError::Config(format!("encode flags: {e}")))?;
        print!("{text}");
        return Ok(());
    };
    let flag = Flag::parse(name).ok_or_else(|| {
        GeigerError::Config(format!(
            "unknown flag '{name}' (expected debug, network, file or display)"
        ))
    })?;

    match value {
        None => println!("{}: {}", flag.name(), on_off(current.get(flag))),
        Some(v) => {
            let mut next = current;
            next.set(flag, parse_switch(v)?);
            // Unlike the console, a failed write here is the command's failure.
            let mut store = store;
            store.persist(&next)?;
            println!("{}: {}", flag.name(), on_off(next.get(flag)));
        }
    }
    Ok(())
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::parse_switch;
    use rstest::rstest;

    #[rstest]
    #[case("on", true)]
    #[case("OFF", false)]
    #[case(" true ", true)]
    #[case("0", false)]
    fn switches_parse(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(parse_switch(input).unwrap(), expected);
    }

    #[test]
    fn bad_switch_is_a_config_error() {
        let err = parse_switch("maybe").unwrap_err();
        assert_eq!(crate::error_fmt::exit_code_for_error(&err), 2);
    }
}
