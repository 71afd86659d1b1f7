use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn since_epoch() -> Duration {
    // A clock set before 1970 reads as the epoch itself
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

/// Returns the number of milliseconds since UNIX EPOCH
#[inline]
pub fn unix_now() -> u64 {
    since_epoch().as_millis() as u64
}

/// Returns the number of seconds since UNIX EPOCH, the resolution host-ledger timelocks are expressed in
#[inline]
pub fn unix_now_secs() -> u64 {
    since_epoch().as_secs()
}
