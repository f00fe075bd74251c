//! Threshold alerts, evaluated once per period on the instantaneous sample.
//!
//! No trend, no deduplication: a sustained excursion fires every period it
//! stays above the threshold. Delivery is fire-and-forget.
use geiger_traits::{AlertPayload, AlertSink};

use crate::dose::DoseRate;
use crate::hw_error::map_sink_error;

/// Decimal places of the dose rate in the alert body.
pub const ALERT_DOSE_PRECISION: usize = 4;

/// Strict threshold crossing.
#[inline]
pub fn exceeds(cpm: f64, threshold_cpm: u32) -> bool {
    cpm > f64::from(threshold_cpm)
}

/// Render the webhook body for one sample.
pub fn alert_payload(cpm: u32, dose: DoseRate) -> AlertPayload {
    AlertPayload {
        value1: cpm.to_string(),
        value2: format!("{:.*}", ALERT_DOSE_PRECISION, dose.value()),
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertOutcome {
    /// Sample strictly exceeded the threshold.
    pub fired: bool,
    /// The sink accepted the notification.
    pub delivered: bool,
}

pub struct AlertDispatcher {
    threshold_cpm: u32,
    sink: Box<dyn AlertSink + Send>,
    fired_total: u64,
    failed_total: u64,
}

impl core::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("threshold_cpm", &self.threshold_cpm)
            .field("fired_total", &self.fired_total)
            .field("failed_total", &self.failed_total)
            .finish()
    }
}

impl AlertDispatcher {
    pub fn new(threshold_cpm: u32, sink: Box<dyn AlertSink + Send>) -> Self {
        Self {
            threshold_cpm,
            sink,
            fired_total: 0,
            failed_total: 0,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold_cpm
    }

    pub fn fired_total(&self) -> u64 {
        self.fired_total
    }

    pub fn failed_total(&self) -> u64 {
        self.failed_total
    }

    /// Compare `cpm` with the threshold and, when `deliver` is set and the
    /// threshold is exceeded, hand one notification to the sink.
    pub fn evaluate(&mut self, cpm: f64, dose: DoseRate, deliver: bool) -> AlertOutcome {
        if !exceeds(cpm, self.threshold_cpm) {
            return AlertOutcome::default();
        }
        self.fired_total = self.fired_total.saturating_add(1);
        // Rounded up so the reported count never reads at or below the
        // threshold that fired it.
        let whole = if cpm >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            cpm.ceil() as u32
        };
        tracing::info!(cpm = whole, threshold = self.threshold_cpm, "alert threshold exceeded");
        if !deliver {
            return AlertOutcome {
                fired: true,
                delivered: false,
            };
        }
        let payload = alert_payload(whole, dose);
        match self.sink.notify(&payload) {
            Ok(()) => AlertOutcome {
                fired: true,
                delivered: true,
            },
            Err(e) => {
                self.failed_total = self.failed_total.saturating_add(1);
                let err = map_sink_error(e.as_ref());
                tracing::warn!(error = %err, "alert delivery failed; dropped");
                AlertOutcome {
                    fired: true,
                    delivered: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geiger_traits::BoxError;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<AlertPayload>>>);
    impl AlertSink for Recorder {
        fn notify(&mut self, alert: &AlertPayload) -> Result<(), BoxError> {
            self.0.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    struct Failing;
    impl AlertSink for Failing {
        fn notify(&mut self, _alert: &AlertPayload) -> Result<(), BoxError> {
            Err("webhook unreachable".into())
        }
    }

    #[test]
    fn strict_comparison() {
        assert!(!exceeds(100.0, 100));
        assert!(exceeds(101.0, 100));
        assert!(exceeds(100.5, 100));
    }

    #[test]
    fn payload_is_text_with_fixed_precision() {
        let p = alert_payload(123, DoseRate(0.998_805_555));
        assert_eq!(p.value1, "123");
        assert_eq!(p.value2, "0.9988");
    }

    #[test]
    fn sustained_excursion_refires_every_period() {
        let rec = Recorder::default();
        let mut d = AlertDispatcher::new(50, Box::new(rec.clone()));
        for _ in 0..3 {
            let out = d.evaluate(80.0, DoseRate(0.65), true);
            assert!(out.fired && out.delivered);
        }
        assert_eq!(rec.0.lock().unwrap().len(), 3);
        assert_eq!(d.fired_total(), 3);
    }

    #[test]
    fn below_threshold_sends_nothing() {
        let rec = Recorder::default();
        let mut d = AlertDispatcher::new(50, Box::new(rec.clone()));
        assert_eq!(d.evaluate(50.0, DoseRate(0.4), true), AlertOutcome::default());
        assert!(rec.0.lock().unwrap().is_empty());
    }

    #[test]
    fn delivery_failure_is_counted_not_retried() {
        let mut d = AlertDispatcher::new(10, Box::new(Failing));
        let out = d.evaluate(20.0, DoseRate(0.16), true);
        assert!(out.fired);
        assert!(!out.delivered);
        assert_eq!(d.failed_total(), 1);
    }

    #[test]
    fn fractional_rate_reports_count_above_threshold() {
        let rec = Recorder::default();
        let mut d = AlertDispatcher::new(100, Box::new(rec.clone()));
        let out = d.evaluate(100.7, DoseRate(0.8177), true);
        assert!(out.fired && out.delivered);
        let sent = rec.0.lock().unwrap();
        assert_eq!(sent[0].value1, "101");
        assert_eq!(sent[0].value2, "0.8177");
    }

    #[test]
    fn gated_delivery_still_reports_fired() {
        let rec = Recorder::default();
        let mut d = AlertDispatcher::new(10, Box::new(rec.clone()));
        let out = d.evaluate(20.0, DoseRate(0.16), false);
        assert!(out.fired && !out.delivered);
        assert!(rec.0.lock().unwrap().is_empty());
    }
}
