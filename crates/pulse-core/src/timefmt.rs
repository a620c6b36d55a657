use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

/// Rendering used for every `*_published` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed offset for `hours` east of UTC, falling back to UTC when out of range.
#[must_use]
pub fn offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Render an instant in the configured output offset.
#[must_use]
pub fn format_local<Tz: TimeZone>(instant: &DateTime<Tz>, offset_hours: i32) -> String {
    instant
        .with_timezone(&offset(offset_hours))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Parse a Graph API timestamp such as `2018-03-01T09:30:00+0000`.
///
/// # Errors
///
/// Returns the chrono parse error for malformed input.
pub fn parse_graph_time(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
}

/// Graph API timestamp re-rendered in the output offset. Unparseable input is
/// passed through unchanged.
#[must_use]
pub fn graph_time_local(raw: &str, offset_hours: i32) -> String {
    match parse_graph_time(raw) {
        Ok(instant) => format_local(&instant, offset_hours),
        Err(e) => {
            tracing::warn!(raw, error = %e, "unparseable graph timestamp; keeping raw value");
            raw.to_string()
        }
    }
}

/// RFC 3339 timestamp (Twitter v2) re-rendered in the output offset.
#[must_use]
pub fn rfc3339_local(raw: &str, offset_hours: i32) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(instant) => format_local(&instant, offset_hours),
        Err(e) => {
            tracing::warn!(raw, error = %e, "unparseable rfc3339 timestamp; keeping raw value");
            raw.to_string()
        }
    }
}

/// Epoch milliseconds (LinkedIn) rendered in the output offset.
#[must_use]
pub fn millis_local(millis: i64, offset_hours: i32) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|instant| format_local(&instant, offset_hours))
}
