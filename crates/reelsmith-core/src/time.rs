//! UTC timestamps for persisted documents

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as an RFC 3339 string with millisecond precision, e.g.
/// `2026-10-16T09:30:00.123Z`
pub fn now_rfc3339() -> String {
    timestamp_rfc3339(Utc::now())
}

/// Format a specific instant the same way as [`now_rfc3339`]
pub fn timestamp_rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
