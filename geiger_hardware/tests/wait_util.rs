use std::time::{Duration, Instant};

use geiger_hardware::util::sleep_until_or_timeout;

#[test]
fn past_deadline_returns_immediately() {
    let start = Instant::now();
    assert!(sleep_until_or_timeout(start, Duration::from_millis(500)));
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[test]
fn near_deadline_is_reached() {
    let deadline = Instant::now() + Duration::from_millis(3);
    assert!(sleep_until_or_timeout(deadline, Duration::from_millis(50)));
    assert!(Instant::now() >= deadline);
}

#[test]
fn far_deadline_times_out_first() {
    let start = Instant::now();
    let deadline = start + Duration::from_secs(10);
    assert!(!sleep_until_or_timeout(deadline, Duration::from_millis(5)));
    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(5));
    assert!(waited < Duration::from_secs(1), "waited {waited:?}");
}
