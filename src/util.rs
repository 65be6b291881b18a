use std::time::{SystemTime, UNIX_EPOCH};

/// Tick value for a point in time: nanoseconds since the Unix epoch,
/// saturated into an `i64`. Pre-epoch times clamp to zero.
pub fn ticks_at(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX),
        Err(_) => 0,
    }
}

/// Current time in ticks. Usage timestamps and eviction thresholds all use
/// this scale.
pub fn now_ticks() -> i64 {
    ticks_at(SystemTime::now())
}
