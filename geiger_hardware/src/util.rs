use std::time::{Duration, Instant};

/// Sleep until `deadline` or for at most `timeout`, whichever comes first.
/// Returns true when the deadline was reached.
pub fn sleep_until_or_timeout(deadline: Instant, timeout: Duration) -> bool {
    let now = Instant::now();
    if deadline <= now {
        return true;
    }
    let remaining = deadline - now;
    if remaining <= timeout {
        std::thread::sleep(remaining);
        true
    } else {
        std::thread::sleep(timeout);
        false
    }
}
