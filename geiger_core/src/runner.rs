use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::acquisition::Acquisition;
use crate::console::Command;
use crate::error::{GeigerError, Result};
use crate::monitor::{Monitor, Reading};

/// When `run` should return on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLimits {
    /// Stop after this many sampling periods. `None` runs until shutdown.
    pub max_periods: Option<u64>,
}

/// Totals over one `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub periods: u64,
    pub alerts_fired: u64,
    pub rearms: u64,
    pub commands: u64,
}

/// Observations handed to the caller while the loop runs.
#[derive(Debug)]
pub enum RunEvent<'a> {
    Reading(&'a Reading),
    /// Reply text for a console command.
    Reply(&'a Command, &'a str),
}

/// Idle time before the next poll: the loop interval, but never past the
/// end of the open window.
#[inline]
fn idle_for(poll: Duration, remaining_ms: u64) -> Duration {
    poll.min(Duration::from_millis(remaining_ms.max(1)))
}

/// Drive `monitor` until `shutdown` is raised or `limits` are reached.
///
/// Commands are applied between periods, in arrival order, and are
/// serviced within one poll interval. When `acquisition` is given and its
/// thread has died, the loop stops with a hardware fault.
pub fn run(
    monitor: &mut Monitor,
    acquisition: Option<&Acquisition>,
    commands: &Receiver<Command>,
    shutdown: &AtomicBool,
    limits: RunLimits,
    mut on_event: impl FnMut(RunEvent<'_>),
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut commands_open = true;
    tracing::info!(max_periods = ?limits.max_periods, "monitor loop start");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if let Some(acq) = acquisition
            && !acq.is_running()
        {
            return Err(eyre::Report::new(GeigerError::HardwareFault(
                "acquisition thread exited".into(),
            )));
        }

        if let Some(reading) = monitor.poll() {
            summary.periods += 1;
            if reading.alert.fired {
                summary.alerts_fired += 1;
            }
            if reading.rearmed {
                summary.rearms += 1;
            }
            on_event(RunEvent::Reading(&reading));
            if limits.max_periods.is_some_and(|max| summary.periods >= max) {
                break;
            }
        }

        if commands_open {
            loop {
                match commands.try_recv() {
                    Ok(cmd) => {
                        summary.commands += 1;
                        let reply = monitor.apply(&cmd);
                        on_event(RunEvent::Reply(&cmd, &reply));
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::debug!("command channel closed");
                        commands_open = false;
                        break;
                    }
                }
            }
        }

        monitor.idle(idle_for(monitor.poll_interval(), monitor.remaining_ms()));
    }

    tracing::info!(
        periods = summary.periods,
        alerts = summary.alerts_fired,
        rearms = summary.rearms,
        "monitor loop stop"
    );
    Ok(summary)
}
