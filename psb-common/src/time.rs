//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Chat-platform relative timestamp markup (`<t:UNIX:R>`), rendered by the
/// client as "3 hours ago" in the reader's locale
pub fn relative_markup(timestamp: &DateTime<Utc>) -> String {
    format!("<t:{}:R>", timestamp.timestamp())
}

/// Plain-text relative time, for surfaces that cannot render markup
pub fn format_relative(timestamp: &DateTime<Utc>, reference: &DateTime<Utc>) -> String {
    let seconds = (*reference - *timestamp).num_seconds();
    if seconds < 0 {
        return "in the future".to_string();
    }

    let (value, unit) = match seconds {
        0..=59 => return "just now".to_string(),
        60..=3_599 => (seconds / 60, "minute"),
        3_600..=86_399 => (seconds / 3_600, "hour"),
        _ => (seconds / 86_400, "day"),
    };

    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}
