use geiger_core::error::BuildError;
use geiger_core::{FilterCfg, HistoryCfg, Monitor, SamplingCfg, TelemetryCfg, TubeCfg};
use rstest::rstest;

fn expect_invalid(err: eyre::Report, needle: &str) {
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => {
            assert!(msg.contains(needle), "got '{msg}', wanted '{needle}'");
        }
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
#[case(0.0)]
#[case(1.0)]
#[case(1.2)]
#[case(-0.5)]
fn weight_outside_open_interval_is_rejected(#[case] weight: f64) {
    let err = Monitor::builder()
        .with_filter(FilterCfg {
            weight,
            ..Default::default()
        })
        .build()
        .expect_err("weight must be rejected");
    expect_invalid(err, "weight");
}

#[test]
fn zero_window_is_rejected() {
    let err = Monitor::builder()
        .with_sampling(SamplingCfg {
            window_ms: 0,
            ..Default::default()
        })
        .build()
        .expect_err("zero window");
    expect_invalid(err, "window_ms");
}

#[test]
fn zero_poll_is_rejected() {
    let err = Monitor::builder()
        .with_sampling(SamplingCfg {
            poll_ms: 0,
            ..Default::default()
        })
        .build()
        .expect_err("zero poll");
    expect_invalid(err, "poll_ms");
}

#[test]
fn empty_history_is_rejected() {
    let err = Monitor::builder()
        .with_history(HistoryCfg {
            capacity: 0,
            ..Default::default()
        })
        .build()
        .expect_err("zero capacity");
    expect_invalid(err, "capacity");
}

#[rstest]
#[case(0.0)]
#[case(-1.0)]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
fn bad_tube_factor_is_rejected(#[case] factor: f64) {
    let err = Monitor::builder()
        .with_tube(TubeCfg { factor })
        .build()
        .expect_err("bad factor");
    expect_invalid(err, "tube factor");
}

#[test]
fn out_of_range_location_is_rejected() {
    let err = Monitor::builder()
        .with_telemetry(TelemetryCfg {
            location: Some((91.0, 0.0)),
        })
        .build()
        .expect_err("bad latitude");
    expect_invalid(err, "location");
}

#[test]
fn defaults_build() {
    let m = Monitor::builder().build().unwrap();
    assert_eq!(m.history().capacity(), 5);
    assert_eq!(m.alerts().threshold(), 100);
}

#[test]
fn toml_config_builds_and_reads_flag_file() {
    let dir = tempfile::tempdir().unwrap();
    let flags = dir.path().join("flags.toml");
    std::fs::write(&flags, "debug = true\nnetwork = true\n").unwrap();
    let toml = format!(
        "[sampling]\nwindow_ms = 15000\n[history]\ncapacity = 60\n[flags]\npath = {:?}\n",
        flags.display().to_string()
    );
    let cfg = geiger_config::load_toml(&toml).unwrap();
    cfg.validate().unwrap();
    let m = Monitor::builder().with_config(&cfg).unwrap().build().unwrap();
    assert_eq!(m.history().capacity(), 60);
    assert!(m.flags().debug);
    assert!(m.flags().network);
    assert!(m.flags().display);
}
