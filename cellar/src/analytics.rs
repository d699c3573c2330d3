//! Per-list analytics arithmetic and the bounded access log.
//!
//! Counters live on the export record and are patched best-effort; nothing
//! here may fail a user-facing request.

use serde::{Deserialize, Serialize};

/// Hard cap on entries kept in the access log.
pub const ACCESS_LOG_MAX_ENTRIES: usize = 100;
/// The log is stored as serialized text; the store caps text values at
/// 2000 characters, so older entries are dropped until it fits.
pub const ACCESS_LOG_MAX_CHARS: usize = 2000;

/// Sessions longer than an hour are treated as an idle tab, not a visit.
pub const MAX_SESSION_SECS: u64 = 3600;

// Analytics property names on the export record.
pub const PROP_VIEWS: &str = "Views";
pub const PROP_AVG_DURATION: &str = "Avg Duration";
pub const PROP_MAX_DURATION: &str = "Max Duration";
pub const PROP_LAST_VISITOR: &str = "Last Visitor";
pub const PROP_LAST_VISITOR_IP: &str = "Last Visitor IP";
pub const PROP_ACCESS_LOG: &str = "Access Log";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// ISO-8601 UTC timestamp
    pub t: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub loc: String,
    /// Filtered-variant flag
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub filtered: bool,
}

/// Prepends an entry to the serialized access log, enforcing both caps.
/// An unparseable stored log is discarded and restarted from this entry.
pub fn push_access_log(stored: Option<&str>, entry: AccessLogEntry) -> String {
    let mut entries: Vec<AccessLogEntry> = stored
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();

    entries.insert(0, entry);
    entries.truncate(ACCESS_LOG_MAX_ENTRIES);

    let mut serialized = serialize_log(&entries);
    while serialized.chars().count() > ACCESS_LOG_MAX_CHARS && entries.pop().is_some() {
        serialized = serialize_log(&entries);
    }
    serialized
}

fn serialize_log(entries: &[AccessLogEntry]) -> String {
    serde_json::to_string(entries).unwrap_or_else(|_| "[]".to_string())
}

/// Recomputes the rolling average after a session of `duration` seconds,
/// where `views` already counts the session being reported.
pub fn rolling_average(old_avg: u64, views: u64, duration: u64) -> u64 {
    if views == 0 {
        return 0;
    }
    let total = old_avg * (views - 1) + duration;
    ((total as f64) / (views as f64)).round() as u64
}

/// Clamps a reported duration to the session ceiling; non-positive reports
/// are discarded.
pub fn clamp_duration(duration: i64) -> Option<u64> {
    if duration <= 0 {
        return None;
    }
    Some((duration as u64).min(MAX_SESSION_SECS))
}
