//! Human-friendly timestamps

use chrono::{DateTime, Duration, Utc};

/// Format `at` relative to `now`
///
/// Under a minute: "just now"; under an hour: minutes; under a day: hours;
/// under a week: weekday and time; older: the date. Timestamps in the future
/// count as "just now".
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);

    if elapsed < Duration::minutes(1) {
        return "just now".to_string();
    }
    if elapsed < Duration::hours(1) {
        return plural(elapsed.num_minutes(), "minute");
    }
    if elapsed < Duration::days(1) {
        return plural(elapsed.num_hours(), "hour");
    }
    if elapsed < Duration::days(7) {
        return at.format("%A %H:%M").to_string();
    }
    at.format("%Y-%m-%d").to_string()
}

/// Absolute timestamp for exports
pub fn format_absolute(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
