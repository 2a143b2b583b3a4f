//! UTC timestamps and `from/to` ranges as they appear in filters and forms.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    #[error("Invalid date range '{0}', expected 'from/to'")]
    InvalidRange(String),

    #[error("Date range '{0}' ends before it starts")]
    Reversed(String),
}

/// Inclusive `[from, to]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.from && *instant <= self.to
    }

    pub fn overlaps(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
        *start <= self.to && *end >= self.from
    }
}

/// Parse an RFC 3339 timestamp and normalise it to UTC.
pub fn parse_utc(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DateParseError::InvalidDate(input.to_string()))
}

/// Parse `from/to`, e.g. `2024-01-01T00:00:00Z/2024-01-31T23:59:59Z`.
pub fn parse_date_range(input: &str) -> Result<DateRange, DateParseError> {
    let (from, to) = input
        .split_once('/')
        .ok_or_else(|| DateParseError::InvalidRange(input.to_string()))?;

    if from.trim().is_empty() || to.trim().is_empty() {
        return Err(DateParseError::InvalidRange(input.to_string()));
    }

    let range = DateRange {
        from: parse_utc(from)?,
        to: parse_utc(to)?,
    };
    if range.from > range.to {
        return Err(DateParseError::Reversed(input.to_string()));
    }
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_utc_normalises_offset() {
        let parsed = parse_utc("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_utc_rejects_garbage() {
        assert!(matches!(parse_utc("yesterday"), Err(DateParseError::InvalidDate(_))));
    }

    #[test]
    fn test_range() {
        let range = parse_date_range("2024-01-01T00:00:00Z/2024-01-31T00:00:00Z").unwrap();
        assert!(range.contains(&Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()));
        assert!(!range.contains(&Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_range_errors() {
        assert!(matches!(
            parse_date_range("2024-01-01T00:00:00Z"),
            Err(DateParseError::InvalidRange(_))
        ));
        assert!(matches!(
            parse_date_range("2024-01-01T00:00:00Z/"),
            Err(DateParseError::InvalidRange(_))
        ));
        assert!(matches!(
            parse_date_range("2024-02-01T00:00:00Z/2024-01-01T00:00:00Z"),
            Err(DateParseError::Reversed(_))
        ));
    }
}
