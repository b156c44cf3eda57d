//! Timestamp parsing for tabular payloads.
//!
//! Remote services return date indexes in a handful of shapes; all of them
//! are normalised to a naive UTC datetime.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

/// Parse an index timestamp.
///
/// Accepts RFC 3339 (`2021-01-01T00:00:00.000Z`), `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD HH:MM:SS` and bare dates (`YYYY-MM-DD`).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).naive_utc());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ndt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(ndt);
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}
