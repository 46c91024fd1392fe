#![allow(dead_code)]

use bitemporal::interval::Instant;
use chrono::{Duration, TimeZone, Utc};

/// Midnight UTC on the given day of January 2024.
pub fn day(d: u32) -> Instant {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

pub fn day_hour(d: u32, h: i64) -> Instant {
    day(d) + Duration::hours(h)
}

/// Routes `tracing` output through the test harness; RUST_LOG picks the level.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
