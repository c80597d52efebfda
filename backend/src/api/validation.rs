//! Shared input validation helpers.
//!
//! Form input arrives as free text from residents and staff. These helpers
//! normalize it once so every handler applies the same trimming, optional
//! field, and date/time rules.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::error::{AppError, Result};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Trim an optional input, treating a missing field as empty.
pub fn field(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

/// Trim an optional input; empty becomes `None` so it is stored as NULL.
pub fn optional_field(value: &Option<String>) -> Option<String> {
    let trimmed = field(value);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// True when every value is non-empty after trimming.
pub fn all_present(values: &[&str]) -> bool {
    values.iter().all(|v| !v.trim().is_empty())
}

/// Parse an ISO-8601 style date/time as entered in a form.
///
/// Accepts `YYYY-MM-DDTHH:MM[:SS[.fff]]` (also with a space separator),
/// RFC 3339 with an offset, or a plain `YYYY-MM-DD` (midnight). Times without
/// an offset are taken as UTC. The result is truncated to whole seconds.
/// Years outside 1..=9999 are rejected.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(|naive| naive.and_utc())
        })?;

    if !(MIN_YEAR..=MAX_YEAR).contains(&parsed.year()) {
        return None;
    }
    parsed.with_nanosecond(0)
}

/// Validate that a shelter is one of the configured sites.
pub fn require_shelter(shelters: &[String], shelter: &str) -> Result<()> {
    if shelters.iter().any(|s| s == shelter) {
        Ok(())
    } else {
        Err(AppError::Validation("Select a valid shelter.".to_string()))
    }
}

/// Current time truncated to whole seconds, matching stored timestamps.
pub fn now_seconds() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // -----------------------------------------------------------------------
    // Date/time parsing
    // -----------------------------------------------------------------------

    #[test]
    fn test_parses_datetime_local_input() {
        let dt = parse_datetime("2025-03-01T18:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_parses_seconds_and_truncates_fraction() {
        let dt = parse_datetime("2025-03-01T18:30:15.987654").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 15).unwrap());
    }

    #[test]
    fn test_parses_space_separator() {
        let dt = parse_datetime("2025-03-01 08:05:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 8, 5, 0).unwrap());
    }

    #[test]
    fn test_parses_offset_and_converts_to_utc() {
        let dt = parse_datetime("2025-03-01T18:30:00-05:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 23, 30, 0).unwrap());
    }

    #[test]
    fn test_parses_plain_date_as_midnight() {
        let dt = parse_datetime("2025-03-01").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_datetime("tomorrow at noon").is_none());
        assert!(parse_datetime("2025-13-01T10:00").is_none());
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("   ").is_none());
    }

    #[test]
    fn test_rejects_signed_and_out_of_range_years() {
        assert!(parse_datetime("+262142-12-30T00:00").is_none());
        assert!(parse_datetime("-0044-03-15T12:00").is_none());
        assert!(parse_datetime("+12025-01-01T00:00:00Z").is_none());
        assert!(parse_datetime("9999-12-31T23:59").is_some());
    }

    // -----------------------------------------------------------------------
    // Field helpers
    // -----------------------------------------------------------------------

    #[test]
    fn test_field_trims_and_defaults() {
        assert_eq!(field(&Some("  Ana ".into())), "Ana");
        assert_eq!(field(&None), "");
    }

    #[test]
    fn test_optional_field_empty_is_none() {
        assert_eq!(optional_field(&Some("   ".into())), None);
        assert_eq!(optional_field(&None), None);
        assert_eq!(optional_field(&Some(" note ".into())), Some("note".into()));
    }

    #[test]
    fn test_all_present() {
        assert!(all_present(&["a", "b"]));
        assert!(!all_present(&["a", " "]));
    }

    #[test]
    fn test_require_shelter() {
        let shelters = vec!["Abba".to_string(), "Haven".to_string()];
        assert!(require_shelter(&shelters, "Haven").is_ok());
        let err = require_shelter(&shelters, "Elsewhere").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Select a valid shelter.");
    }
}
