//! Human-readable error descriptions, exit codes and JSON error output.

use geiger_core::error::{BuildError, GeigerError};
use geiger_hardware::error::HwError;

/// Exit code for configuration problems (bad TOML, out-of-range values).
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when the pulse input cannot be opened or dies.
pub const EXIT_HARDWARE: i32 = 3;

/// Map an eyre::Report to an explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values passed to the monitor builder.\nHow to fix: Edit the config file, then rerun."
        );
    }

    if let Some(ge) = err.downcast_ref::<GeigerError>() {
        return match ge {
            GeigerError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo in the TOML or a value outside its allowed range.\nHow to fix: Edit the config file named by --config and try again."
            ),
            GeigerError::Hardware(msg) => format!(
                "What happened: The pulse input could not be opened ({msg}).\nLikely causes: Wrong [pins] pulse_in value or no permission to access GPIO.\nHow to fix: Check the wiring and [pins] in the config; run as a user with GPIO access."
            ),
            GeigerError::HardwareFault(msg) => format!(
                "What happened: Pulse acquisition stopped ({msg}).\nLikely causes: The GPIO line was released or the edge source failed repeatedly.\nHow to fix: Check the tube interface and rerun with --log-level=debug."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(hw) = err.downcast_ref::<HwError>() {
        return format!(
            "What happened: Hardware setup failed ({hw}).\nLikely causes: Invalid pin or simulated rate.\nHow to fix: Check [pins] in the config and the GEIGER_SIM_CPM environment variable."
        );
    }

    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 for configuration, 3 for hardware, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return EXIT_CONFIG;
    }
    if err.downcast_ref::<HwError>().is_some() {
        return EXIT_HARDWARE;
    }
    match err.downcast_ref::<GeigerError>() {
        Some(GeigerError::Config(_)) => EXIT_CONFIG,
        Some(GeigerError::Hardware(_) | GeigerError::HardwareFault(_)) => EXIT_HARDWARE,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        EXIT_CONFIG => "Config",
        EXIT_HARDWARE => "Hardware",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_two() {
        let e = eyre::Report::new(GeigerError::Config("filter.weight must be in (0.0, 1.0)".into()));
        assert_eq!(exit_code_for_error(&e), EXIT_CONFIG);
        assert!(humanize(&e).contains("filter.weight"));
        let e = eyre::Report::new(BuildError::InvalidConfig("window_ms must be > 0"));
        assert_eq!(exit_code_for_error(&e), EXIT_CONFIG);
    }

    #[test]
    fn hardware_errors_map_to_three() {
        let e = eyre::Report::new(HwError::InvalidRate(-1.0));
        assert_eq!(exit_code_for_error(&e), EXIT_HARDWARE);
        let e = eyre::Report::new(GeigerError::HardwareFault("acquisition thread exited".into()));
        assert_eq!(exit_code_for_error(&e), EXIT_HARDWARE);
    }

    #[test]
    fn runtime_errors_map_to_one() {
        for e in [
            GeigerError::Sink("webhook unreachable".into()),
            GeigerError::Io("spawn acquisition thread: resource unavailable".into()),
        ] {
            let e = eyre::Report::new(e);
            assert_eq!(exit_code_for_error(&e), 1);
            assert_eq!(reason_name(&e), "Error");
        }
    }

    #[test]
    fn json_output_carries_reason_and_message() {
        let e = eyre::eyre!("boom");
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "Error");
        assert!(v["message"].as_str().unwrap().contains("boom"));
        assert_eq!(exit_code_for_error(&e), 1);
    }
}
