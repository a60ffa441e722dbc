//! Format checks for the string-typed time and date fields.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::DATE_FORMAT;
use crate::error::ValidationError;

// Hours must be zero-padded so that lexicographic order is chronological.
static TIME_OF_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

/// Returns `true` for a zero-padded 24-hour `HH:MM` string.
pub fn is_time_of_day(value: &str) -> bool {
    TIME_OF_DAY.is_match(value)
}

pub fn check_time_of_day(field: &str, value: &str) -> Result<(), ValidationError> {
    if is_time_of_day(value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("invalid time '{value}', expected zero-padded 24-hour HH:MM"),
        ))
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
///
/// chrono accepts unpadded months and days, so the length is checked first.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub fn check_date(field: &str, value: &str) -> Result<(), ValidationError> {
    parse_date(value).map(|_| ()).ok_or_else(|| {
        ValidationError::new(field, format!("invalid date '{value}', expected YYYY-MM-DD"))
    })
}

pub fn check_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "must not be empty"))
    } else {
        Ok(())
    }
}

pub fn check_times(times: &[String]) -> Result<(), ValidationError> {
    if times.is_empty() {
        return Err(ValidationError::new("times", "at least one time is required"));
    }
    for (i, time) in times.iter().enumerate() {
        check_time_of_day(&format!("times[{i}]"), time)?;
    }
    Ok(())
}
