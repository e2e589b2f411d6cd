use crate::error::{CoreError, Result};
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::Timestamp;

/// Parses an optional expiration timestamp supplied by a caller.
///
/// An empty (or all-whitespace) string means the link never expires.
/// Accepted forms, tried in order:
///
/// - an instant with an offset: `2025-01-02T15:04:05Z`, `2025-01-02T15:04:05+08:00`
/// - a civil date-time: `2025-01-02T15:04:05` or `2025-01-02 15:04:05`
/// - a civil date: `2025-01-02` (midnight)
///
/// Civil values carry no zone and are interpreted as UTC.
pub fn parse_expiration(raw: &str) -> Result<Option<Timestamp>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Ok(Some(ts));
    }

    let civil = raw
        .parse::<DateTime>()
        .or_else(|_| raw.parse::<Date>().map(|date| date.at(0, 0, 0, 0)))
        .map_err(|e| CoreError::InvalidExpiration(format!("'{raw}': {e}")))?;

    civil
        .to_zoned(TimeZone::UTC)
        .map(|zoned| Some(zoned.timestamp()))
        .map_err(|e| CoreError::InvalidExpiration(format!("'{raw}': {e}")))
}
