use chrono::{DateTime, FixedOffset};

/// `createdAt` format used by the search API, e.g. `Tue Dec 02 02:35:56 +0000 2025`
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parses an API `createdAt` string with its explicit offset
pub fn parse_created_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw.trim(), CREATED_AT_FORMAT).ok()
}

/// Formats a timestamp the way the API does
pub fn format_created_at(dt: &DateTime<FixedOffset>) -> String {
    dt.format(CREATED_AT_FORMAT).to_string()
}

/// Returns the `YYYY-MM` key of the date a timestamp falls on, in its own offset
pub fn month_key_of(raw: &str) -> Option<String> {
    parse_created_at(raw).map(|dt| dt.date_naive().format("%Y-%m").to_string())
}
