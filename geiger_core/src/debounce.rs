//! Edge admission: level check, bounded wait for deassert, optional dead time.
use geiger_traits::PulseLine;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Debounce configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceCfg {
    /// Reject the edge when the line is no longer asserted on entry.
    pub verify_level: bool,
    /// Upper bound on polls while waiting for the line to deassert.
    /// 0 disables the wait.
    pub max_spin_iters: u32,
    /// After an accepted pulse, ignore edges until the consumer re-arms the
    /// gate, which it does once this many ms have passed. 0 disables.
    pub dead_time_ms: u64,
}

impl Default for DebounceCfg {
    fn default() -> Self {
        Self {
            verify_level: true,
            max_spin_iters: 10_000,
            dead_time_ms: 0,
        }
    }
}

/// What the gate decided about one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Count it.
    Accepted,
    /// Gate is inside its dead time (or was never re-armed).
    Disarmed,
    /// Line already back at idle on entry: electrical bounce.
    Bounce,
    /// Line stayed asserted past `max_spin_iters` polls.
    SpinExceeded,
}

#[derive(Debug)]
pub struct DebounceGate {
    cfg: DebounceCfg,
    armed: AtomicBool,
    disarmed_at_ms: AtomicU64,
}

impl DebounceGate {
    pub fn new(cfg: DebounceCfg) -> Self {
        Self {
            cfg,
            armed: AtomicBool::new(true),
            disarmed_at_ms: AtomicU64::new(0),
        }
    }

    pub fn cfg(&self) -> &DebounceCfg {
        &self.cfg
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Decide whether the edge that just fired is a new physical pulse.
    ///
    /// Runs in the edge-handling context: bounded time, no allocation,
    /// no blocking.
    pub fn admit(&self, line: &dyn PulseLine, now_ms: u64) -> GateOutcome {
        if !self.armed.load(Ordering::Acquire) {
            return GateOutcome::Disarmed;
        }
        if self.cfg.verify_level && !line.is_asserted() {
            return GateOutcome::Bounce;
        }
        if self.cfg.max_spin_iters > 0 {
            let mut polls = 0u32;
            while line.is_asserted() {
                if polls >= self.cfg.max_spin_iters {
                    return GateOutcome::SpinExceeded;
                }
                polls += 1;
                std::hint::spin_loop();
            }
        }
        if self.cfg.dead_time_ms > 0 {
            self.disarmed_at_ms.store(now_ms, Ordering::Release);
            self.armed.store(false, Ordering::Release);
        }
        GateOutcome::Accepted
    }

    /// Consumer side: re-arm once the dead time has elapsed.
    /// Returns true when this call re-armed the gate.
    pub fn poll_rearm(&self, now_ms: u64) -> bool {
        if self.armed.load(Ordering::Acquire) {
            return false;
        }
        let since = self.disarmed_at_ms.load(Ordering::Acquire);
        if now_ms.saturating_sub(since) >= self.cfg.dead_time_ms {
            self.armed.store(true, Ordering::Release);
            return true;
        }
        false
    }

    /// Re-arm unconditionally. Returns true if the gate was disarmed.
    pub fn force_rearm(&self) -> bool {
        !self.armed.swap(true, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Line that reads asserted for the first `high_reads` polls.
    struct ScriptedLine {
        high_reads: Cell<u32>,
    }

    impl ScriptedLine {
        fn new(high_reads: u32) -> Self {
            Self {
                high_reads: Cell::new(high_reads),
            }
        }
    }

    impl PulseLine for ScriptedLine {
        fn is_asserted(&self) -> bool {
            let left = self.high_reads.get();
            if left == 0 {
                return false;
            }
            self.high_reads.set(left - 1);
            true
        }
    }

    struct StuckLine;
    impl PulseLine for StuckLine {
        fn is_asserted(&self) -> bool {
            true
        }
    }

    #[test]
    fn clean_pulse_is_accepted() {
        let gate = DebounceGate::new(DebounceCfg::default());
        assert_eq!(gate.admit(&ScriptedLine::new(3), 0), GateOutcome::Accepted);
    }

    #[test]
    fn idle_line_on_entry_is_bounce() {
        let gate = DebounceGate::new(DebounceCfg::default());
        assert_eq!(gate.admit(&ScriptedLine::new(0), 0), GateOutcome::Bounce);
    }

    #[test]
    fn level_check_can_be_disabled() {
        let gate = DebounceGate::new(DebounceCfg {
            verify_level: false,
            max_spin_iters: 0,
            dead_time_ms: 0,
        });
        assert_eq!(gate.admit(&ScriptedLine::new(0), 0), GateOutcome::Accepted);
    }

    #[test]
    fn stuck_line_exceeds_spin_bound_instead_of_hanging() {
        let gate = DebounceGate::new(DebounceCfg {
            verify_level: true,
            max_spin_iters: 100,
            dead_time_ms: 0,
        });
        assert_eq!(gate.admit(&StuckLine, 0), GateOutcome::SpinExceeded);
        // The gate stays armed after a spin failure.
        assert!(gate.is_armed());
    }

    #[test]
    fn dead_time_disarms_until_consumer_rearms() {
        let gate = DebounceGate::new(DebounceCfg {
            verify_level: false,
            max_spin_iters: 0,
            dead_time_ms: 5,
        });
        assert_eq!(gate.admit(&StuckLine, 100), GateOutcome::Accepted);
        assert!(!gate.is_armed());
        assert_eq!(gate.admit(&StuckLine, 101), GateOutcome::Disarmed);
        assert!(!gate.poll_rearm(104));
        assert!(gate.poll_rearm(105));
        assert!(!gate.poll_rearm(106));
        assert_eq!(gate.admit(&StuckLine, 106), GateOutcome::Accepted);
    }

    #[test]
    fn force_rearm_reports_previous_state() {
        let gate = DebounceGate::new(DebounceCfg {
            verify_level: false,
            max_spin_iters: 0,
            dead_time_ms: 1_000,
        });
        assert!(!gate.force_rearm());
        gate.admit(&StuckLine, 0);
        assert!(gate.force_rearm());
        assert!(gate.is_armed());
    }
}
