//! Maps `Box<dyn Error>` from trait boundaries to typed `GeigerError`.
//!
//! The traits in `geiger_traits` use `Box<dyn Error + Send + Sync>` so any
//! edge source or sink can plug in; this module converts those to our typed
//! error enum, with an optional feature-gated path for
//! `geiger_hardware::HwError` downcasting.

use crate::error::GeigerError;

/// Map an edge-source error to a typed `GeigerError`.
pub fn map_source_error(e: &(dyn std::error::Error + 'static)) -> GeigerError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<geiger_hardware::error::HwError>() {
            return match hw {
                geiger_hardware::error::HwError::Io(io) => GeigerError::Io(io.to_string()),
                other => GeigerError::HardwareFault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return GeigerError::Io(io.to_string());
    }
    GeigerError::Hardware(e.to_string())
}

/// Map a sink error; sinks are collaborators, so everything becomes `Sink`.
pub fn map_sink_error(e: &(dyn std::error::Error + 'static)) -> GeigerError {
    GeigerError::Sink(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_kind() {
        let e = std::io::Error::other("disk gone");
        assert!(matches!(map_source_error(&e), GeigerError::Io(m) if m.contains("disk gone")));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_errors_are_faults() {
        let e = geiger_hardware::error::HwError::Gpio("pin busy".into());
        assert!(matches!(map_source_error(&e), GeigerError::HardwareFault(m) if m.contains("pin busy")));
    }

    #[test]
    fn unknown_errors_fall_back_to_hardware() {
        let e: Box<dyn std::error::Error + Send + Sync> = "glitch".into();
        assert!(matches!(map_source_error(e.as_ref()), GeigerError::Hardware(m) if m == "glitch"));
    }
}
