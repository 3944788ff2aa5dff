/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Current wall-clock time.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Row timestamp layout used by the availability log (`YYYY-MM-DD HH:MM:SS`).
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a timestamp the way the availability log and alert bodies show it.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(LOG_TIMESTAMP_FORMAT).to_string()
}
