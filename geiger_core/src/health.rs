//! Lost-interrupt heuristic: two zero periods in a row mean the acquisition
//! path may be wedged, so force a re-arm.
//!
//! A real zero-radiation reading looks identical; the resulting re-arm is
//! unnecessary but harmless.

#[derive(Debug, Clone, Default)]
pub struct HealthMonitor {
    stalled: bool,
    rearms: u64,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `latest` is this period's CPM, `previous_head` the history head
    /// before this period was pushed (`None` before the first period).
    /// Returns true exactly once per stall: on the first period where both
    /// are zero. A non-zero sample ends the stall.
    pub fn check_stuck(&mut self, latest: f64, previous_head: Option<f64>) -> bool {
        if latest != 0.0 {
            self.stalled = false;
            return false;
        }
        if previous_head != Some(0.0) || self.stalled {
            return false;
        }
        self.stalled = true;
        self.rearms = self.rearms.saturating_add(1);
        true
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Re-arms signalled since startup.
    pub fn rearms(&self) -> u64 {
        self.rearms
    }

    pub fn reset(&mut self) {
        self.stalled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_once_per_stall_run() {
        let mut h = HealthMonitor::new();
        // first zero after a non-zero head: not yet a stall
        assert!(!h.check_stuck(0.0, Some(12.0)));
        assert!(h.check_stuck(0.0, Some(0.0)));
        assert!(!h.check_stuck(0.0, Some(0.0)));
        assert!(!h.check_stuck(0.0, Some(0.0)));
        assert!(h.is_stalled());
        assert!(!h.check_stuck(5.0, Some(0.0)));
        assert!(!h.is_stalled());
        assert!(!h.check_stuck(0.0, Some(5.0)));
        assert!(h.check_stuck(0.0, Some(0.0)));
        assert_eq!(h.rearms(), 2);
    }

    #[test]
    fn first_period_alone_is_not_a_stall() {
        let mut h = HealthMonitor::new();
        assert!(!h.check_stuck(0.0, None));
        assert!(h.check_stuck(0.0, Some(0.0)));
    }
}
