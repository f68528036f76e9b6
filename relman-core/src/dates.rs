//! Strict DD/MM/YYYY date parsing and formatting
//!
//! This is the only textual date format the system accepts. ISO dates,
//! single-digit days and two-digit years are all rejected.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("date pattern is valid")
});

/// Parses a `DD/MM/YYYY` string into a date.
///
/// Empty input fails with [`Error::MissingField`]; anything that does
/// not match the pattern, or matches it but names an impossible
/// calendar day, fails with [`Error::InvalidDate`].
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingField("date"));
    }

    let caps = DATE_RE
        .captures(trimmed)
        .ok_or_else(|| Error::InvalidDate(value.to_string()))?;

    let invalid = || Error::InvalidDate(value.to_string());
    let day: u32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let year: i32 = caps[3].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Formats a date as zero-padded `DD/MM/YYYY`; `None` becomes an empty string.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_then_format_round_trips() {
        for s in ["01/01/2024", "29/02/2024", "31/12/1999", "05/07/2025"] {
            let parsed = parse_date(s).unwrap();
            assert_eq!(format_date(Some(parsed)), s);
        }
    }

    #[test]
    fn test_parse_rejects_impossible_calendar_dates() {
        assert!(matches!(
            parse_date("31/02/2024"),
            Err(Error::InvalidDate(_))
        ));
        // 2023 is not a leap year
        assert!(matches!(
            parse_date("29/02/2023"),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        for s in ["2024-01-05", "1/2/2024", "01/02/24", "01-02-2024", "abc"] {
            assert!(matches!(parse_date(s), Err(Error::InvalidDate(_))), "{s}");
        }
    }

    #[test]
    fn test_parse_empty_is_missing_field() {
        assert!(matches!(parse_date(""), Err(Error::MissingField(_))));
        assert!(matches!(parse_date("   "), Err(Error::MissingField(_))));
    }

    #[test]
    fn test_parse_trims_surrounding_whitespace() {
        assert_eq!(
            parse_date(" 15/06/2024 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
    }

    #[test]
    fn test_format_none_is_empty() {
        assert_eq!(format_date(None), "");
    }
}
