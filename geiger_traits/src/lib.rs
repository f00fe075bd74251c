pub mod clock;
pub mod sink;

pub use clock::{Clock, MonotonicClock};
pub use sink::{
    AlertPayload, AlertSink, DisplaySink, SampleLog, Telemetry, TelemetrySink, TemperatureProbe,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Level view of the tube's pulse line.
///
/// `is_asserted()` is true while the line sits at the level the configured
/// edge moves it to (high after a rising edge, low after a falling edge).
pub trait PulseLine {
    fn is_asserted(&self) -> bool;
}

/// An interrupt-capable pulse input owned by the acquisition context.
pub trait EdgeSource: PulseLine {
    /// Block until the next configured edge or until `timeout` elapses.
    /// Returns `Ok(true)` when an edge fired, `Ok(false)` on timeout.
    fn wait_edge(&mut self, timeout: std::time::Duration) -> Result<bool, BoxError>;

    /// Tear down and re-register the edge interrupt.
    fn rearm(&mut self) -> Result<(), BoxError>;
}
