use geiger_config::{Average, Edge, RateMath, load_toml};
use rstest::rstest;

const FULL: &str = r#"
[pins]
pulse_in = 4
edge = "rising"

[sampling]
window_ms = 15000
rate_math = "float"
poll_ms = 5
edge_timeout_ms = 50

[debounce]
verify_level = true
max_spin_iters = 500
dead_time_ms = 2

[tube]
factor = 0.0057

[history]
capacity = 60
zero_is_empty = false

[filter]
weight = 0.25
average = "weighted"

[alert]
threshold_cpm = 250

[telemetry]
latitude = 47.37
longitude = 8.54

[sinks]
telemetry_path = "telemetry.jsonl"
log_path = "log.csv"

[flags]
path = "state/flags.toml"

[logging]
file = "geiger.log"
level = "debug"
rotation = "daily"
"#;

#[test]
fn parses_every_section() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.pins.pulse_in, 4);
    assert_eq!(cfg.pins.edge, Edge::Rising);
    assert_eq!(cfg.sampling.window_ms, 15_000);
    assert_eq!(cfg.sampling.rate_math, RateMath::Float);
    assert_eq!(cfg.debounce.dead_time_ms, 2);
    assert_eq!(cfg.history.capacity, 60);
    assert!(!cfg.history.zero_is_empty);
    assert_eq!(cfg.filter.average, Average::Weighted);
    assert_eq!(cfg.alert.threshold_cpm, 250);
    assert_eq!(cfg.telemetry.location(), Some((47.37, 8.54)));
    assert_eq!(cfg.sinks.alert_path, None);
}

#[rstest]
#[case("[filter]\nweight = 0.0", "filter.weight must be in (0.0, 1.0)")]
#[case("[filter]\nweight = 1.0", "filter.weight must be in (0.0, 1.0)")]
#[case("[filter]\nweight = -0.5", "filter.weight must be in (0.0, 1.0)")]
#[case("[sampling]\nwindow_ms = 0", "sampling.window_ms must be > 0")]
#[case("[sampling]\nwindow_ms = 100\npoll_ms = 0", "sampling.poll_ms must be >= 1")]
#[case("[sampling]\nwindow_ms = 100\npoll_ms = 500", "must not exceed sampling.window_ms")]
#[case("[history]\ncapacity = 0", "history.capacity must be >= 1")]
#[case("[tube]\nfactor = 0.0", "tube.factor must be a finite value > 0.0")]
#[case("[telemetry]\nlatitude = 10.0", "must be set together")]
#[case("[telemetry]\nlatitude = 95.0\nlongitude = 0.0", "telemetry.latitude must be in")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "error '{err}' should contain '{needle}'"
    );
}

#[test]
fn rejects_unknown_rate_math() {
    let err = load_toml("[sampling]\nrate_math = \"round\"").expect_err("unknown variant");
    assert!(format!("{err}").contains("unknown variant"));
}

#[test]
fn shipped_config_matches_defaults() {
    let cfg = geiger_config::load_toml(include_str!("../../etc/geiger_config.toml")).unwrap();
    cfg.validate().unwrap();
    let d = geiger_config::Config::default();
    assert_eq!(cfg.sampling.window_ms, d.sampling.window_ms);
    assert_eq!(cfg.pins.pulse_in, d.pins.pulse_in);
    assert_eq!(cfg.alert.threshold_cpm, d.alert.threshold_cpm);
    assert_eq!(cfg.flags.path, d.flags.path);
    assert!((cfg.tube.factor - d.tube.factor).abs() < 1e-12);
    assert_eq!(cfg.telemetry.location(), None);
}
