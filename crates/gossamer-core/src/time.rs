//! Hour-epoch timestamps.
//!
//! Announcements are stamped with the start of the UTC hour they were
//! created in, so relays agree on an epoch without synchronised clocks.

use std::time::{SystemTime, UNIX_EPOCH};

pub const NANOS_PER_HOUR: u64 = 60 * 60 * 1_000_000_000;

/// Floor a Unix timestamp in nanoseconds to the start of its hour.
pub fn hour_start_ns(time_ns: u64) -> u64 {
    time_ns - time_ns % NANOS_PER_HOUR
}

/// Current Unix time in nanoseconds. A clock before 1970 reads as zero.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Start of the current UTC hour, in nanoseconds.
pub fn current_hour_start_ns() -> u64 {
    hour_start_ns(now_ns())
}

/// Whole hours from `earlier` to `later`; zero if `later` is not after `earlier`.
pub fn hours_between(earlier_ns: u64, later_ns: u64) -> u64 {
    later_ns.saturating_sub(earlier_ns) / NANOS_PER_HOUR
}
