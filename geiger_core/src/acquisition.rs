//! Pulse acquisition: the edge handler and the thread that drives it.
//!
//! `PulseHandler` is shared (via `Arc`) between the acquisition context,
//! which calls [`PulseHandler::on_pulse_edge`], and the sampling loop, which
//! drains the counter and re-arms the gate. Everything it touches from the
//! edge side is atomic, so the sampling loop never blocks the handler.
//!
//! `Acquisition` spawns exactly one thread that owns the `EdgeSource`; the
//! thread is shut down and joined when the `Acquisition` is dropped.
use geiger_traits::clock::Clock;
use geiger_traits::{EdgeSource, PulseLine};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::counter::PulseCounter;
use crate::debounce::{DebounceCfg, DebounceGate, GateOutcome};
use crate::hw_error::map_source_error;

/// Per-outcome edge totals since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub accepted: u64,
    pub disarmed: u64,
    pub bounces: u64,
    pub spin_failures: u64,
}

pub struct PulseHandler {
    counter: PulseCounter,
    gate: DebounceGate,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    rearm_requested: AtomicBool,
    accepted: AtomicU64,
    disarmed: AtomicU64,
    bounces: AtomicU64,
    spin_failures: AtomicU64,
}

impl core::fmt::Debug for PulseHandler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PulseHandler")
            .field("pending", &self.counter.peek())
            .field("armed", &self.gate.is_armed())
            .field("stats", &self.stats())
            .finish()
    }
}

impl PulseHandler {
    pub fn new(cfg: DebounceCfg, clock: Arc<dyn Clock + Send + Sync>, epoch: Instant) -> Self {
        Self {
            counter: PulseCounter::new(),
            gate: DebounceGate::new(cfg),
            clock,
            epoch,
            rearm_requested: AtomicBool::new(false),
            accepted: AtomicU64::new(0),
            disarmed: AtomicU64::new(0),
            bounces: AtomicU64::new(0),
            spin_failures: AtomicU64::new(0),
        }
    }

    /// Handle one hardware edge. Counts the pulse when the gate admits it.
    pub fn on_pulse_edge(&self, line: &dyn PulseLine) -> GateOutcome {
        let now_ms = self.clock.ms_since(self.epoch);
        let outcome = self.gate.admit(line, now_ms);
        let slot = match outcome {
            GateOutcome::Accepted => {
                self.counter.record();
                &self.accepted
            }
            GateOutcome::Disarmed => &self.disarmed,
            GateOutcome::Bounce => &self.bounces,
            GateOutcome::SpinExceeded => &self.spin_failures,
        };
        slot.fetch_add(1, Ordering::Relaxed);
        outcome
    }

    /// Take the pulses counted since the previous drain.
    #[inline]
    pub fn drain(&self) -> u32 {
        self.counter.drain()
    }

    /// Pulses counted but not yet drained.
    pub fn pending(&self) -> u32 {
        self.counter.peek()
    }

    pub fn is_armed(&self) -> bool {
        self.gate.is_armed()
    }

    /// Consumer-side dead-time re-arm; call once per loop iteration.
    pub fn poll_rearm(&self) -> bool {
        self.gate.poll_rearm(self.clock.ms_since(self.epoch))
    }

    /// Re-arm the gate now and ask the acquisition context to re-register
    /// its edge interrupt.
    pub fn force_rearm(&self) {
        self.gate.force_rearm();
        self.rearm_requested.store(true, Ordering::Release);
    }

    /// Acquisition side: consume a pending re-arm request.
    pub fn take_rearm_request(&self) -> bool {
        self.rearm_requested.swap(false, Ordering::AcqRel)
    }

    pub fn stats(&self) -> AcquisitionStats {
        AcquisitionStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            disarmed: self.disarmed.load(Ordering::Relaxed),
            bounces: self.bounces.load(Ordering::Relaxed),
            spin_failures: self.spin_failures.load(Ordering::Relaxed),
        }
    }
}

/// Name given to the acquisition thread.
pub const ACQUISITION_THREAD_NAME: &str = "acquisition";

pub struct Acquisition {
    shutdown: Arc<AtomicBool>,
    faults: Arc<AtomicU64>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Acquisition {
    /// Spawn the acquisition thread. `edge_timeout` bounds each wait so
    /// shutdown and re-arm requests are serviced promptly.
    pub fn spawn<E: EdgeSource + Send + 'static>(
        mut source: E,
        handler: Arc<PulseHandler>,
        edge_timeout: Duration,
    ) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let faults = Arc::new(AtomicU64::new(0));
        let faults_clone = faults.clone();

        let join_handle = std::thread::Builder::new()
            .name(ACQUISITION_THREAD_NAME.to_string())
            .spawn(move || {
                loop {
                    if shutdown_clone.load(Ordering::Relaxed) {
                        tracing::debug!("Acquisition thread received shutdown signal");
                        break;
                    }

                    if handler.take_rearm_request() {
                        match source.rearm() {
                            Ok(()) => tracing::info!("edge source re-armed"),
                            Err(e) => {
                                let err = map_source_error(e.as_ref());
                                tracing::warn!(error = %err, "edge source re-arm failed");
                            }
                        }
                    }

                    match source.wait_edge(edge_timeout) {
                        Ok(true) => {
                            let outcome = handler.on_pulse_edge(&source);
                            tracing::trace!(?outcome, "pulse edge");
                        }
                        Ok(false) => {}
                        Err(e) => {
                            faults_clone.fetch_add(1, Ordering::Relaxed);
                            let err = map_source_error(e.as_ref());
                            tracing::warn!(error = %err, "edge wait failed");
                            // Back off so a dead source doesn't spin the thread
                            std::thread::sleep(edge_timeout);
                        }
                    }
                }
                tracing::trace!("Acquisition thread exiting cleanly");
            })?;

        Ok(Self {
            shutdown,
            faults,
            join_handle: Some(join_handle),
        })
    }

    /// Number of failed edge waits since spawn.
    pub fn source_faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread notices within one edge timeout.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("Acquisition thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "Acquisition thread panicked during shutdown");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geiger_traits::MonotonicClock;

    struct Always(bool);
    impl PulseLine for Always {
        fn is_asserted(&self) -> bool {
            self.0
        }
    }

    fn handler(cfg: DebounceCfg) -> PulseHandler {
        PulseHandler::new(cfg, Arc::new(MonotonicClock::new()), Instant::now())
    }

    #[test]
    fn accepted_edges_reach_the_counter() {
        let h = handler(DebounceCfg {
            verify_level: true,
            max_spin_iters: 0,
            dead_time_ms: 0,
        });
        for _ in 0..3 {
            assert_eq!(h.on_pulse_edge(&Always(true)), GateOutcome::Accepted);
        }
        assert_eq!(h.on_pulse_edge(&Always(false)), GateOutcome::Bounce);
        assert_eq!(h.pending(), 3);
        assert_eq!(h.drain(), 3);
        assert_eq!(h.pending(), 0);
        let s = h.stats();
        assert_eq!(s.accepted, 3);
        assert_eq!(s.bounces, 1);
    }

    #[test]
    fn spin_failures_are_not_counted() {
        let h = handler(DebounceCfg {
            verify_level: true,
            max_spin_iters: 10,
            dead_time_ms: 0,
        });
        assert_eq!(h.on_pulse_edge(&Always(true)), GateOutcome::SpinExceeded);
        assert_eq!(h.drain(), 0);
        assert_eq!(h.stats().spin_failures, 1);
    }

    #[test]
    fn force_rearm_raises_a_request_once() {
        let h = handler(DebounceCfg::default());
        assert!(!h.take_rearm_request());
        h.force_rearm();
        assert!(h.take_rearm_request());
        assert!(!h.take_rearm_request());
    }
}
