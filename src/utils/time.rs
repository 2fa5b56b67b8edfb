//! Time parsing and formatting utilities

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;

/// Current wall clock in milliseconds since the Unix epoch
pub fn timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse an ISO 8601 duration such as `PT1H2M3S` into whole seconds.
///
/// Day and fractional components are accepted; anything else yields `None`.
pub fn parse_iso8601_duration(value: &str) -> Option<u64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
            .expect("valid duration regex")
    });

    let captures = pattern.captures(value.trim())?;
    let whole = |index: usize| -> u64 {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    let seconds = captures
        .get(4)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    Some(whole(1) * 86_400 + whole(2) * 3600 + whole(3) * 60 + seconds.floor() as u64)
}

/// Format whole seconds as `m:ss`; minutes are not wrapped into hours
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
