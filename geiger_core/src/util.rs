//! Common time helpers for geiger_core.

/// Number of milliseconds in one minute.
pub const MILLIS_PER_MINUTE: u64 = 60_000;

/// Wall-clock time in milliseconds since the Unix epoch (0 if the clock is
/// set before 1970).
#[inline]
pub fn unix_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
