/// Utility functions for timestamps and tick arithmetic
use std::time::Duration;
use time::{format_description, OffsetDateTime};

/// Format a timestamp for the data log
///
/// Converts an OffsetDateTime to YYYY-MM-DD HH:MM:SS format.
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Current time formatted for the data log
pub fn now_formatted() -> String {
    format_datetime(&OffsetDateTime::now_utc())
}

/// Number of whole ticks of `tick` that fit in `span`, never less than one
pub fn ticks_in(span: Duration, tick: Duration) -> u32 {
    if tick.is_zero() {
        return 1;
    }
    let ticks = span.as_millis() / tick.as_millis().max(1);
    u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
}
