//! Input parsing for time strings.
//!
//! Two kinds of input reach the library:
//! - conversion input, which is a local wall-clock time unless it carries
//!   its own offset ([`parse_time_input`])
//! - reference instants for reports and transition searches, given as
//!   RFC3339, epoch seconds or epoch milliseconds ([`parse_instant`])

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};

use crate::error::{Result, TzClockError};

/// Calendar years accepted from callers. Searches and offset samples add up to a
/// horizon on top of the input, which has to stay inside chrono's range.
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Wall-clock layouts accepted for local input, most specific first.
const LOCAL_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A parsed conversion input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInput {
    /// Wall-clock time with no zone attached; read in the source zone.
    Local(NaiveDateTime),
    /// The input named its own offset, so it already is an instant.
    Absolute(DateTime<Utc>),
}

/// Parse a conversion input.
///
/// Strings with a `Z` or `±HH:MM` designator are RFC3339 instants. Anything
/// else must be one of the local wall-clock layouts
/// (`YYYY-MM-DDTHH:MM[:SS[.fff]]`, `T` or a space as separator).
///
/// # Examples
///
/// ```
/// use tzclock_core::parse::{TimeInput, parse_time_input};
///
/// assert!(matches!(parse_time_input("2025-10-19 14:00").unwrap(), TimeInput::Local(_)));
/// assert!(matches!(parse_time_input("2025-10-19T14:00:00Z").unwrap(), TimeInput::Absolute(_)));
/// ```
pub fn parse_time_input(input: &str) -> Result<TimeInput> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        let instant = dt.with_timezone(&Utc);
        ensure_supported_year(instant.year(), input)?;
        return Ok(TimeInput::Absolute(instant));
    }

    let local = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            TzClockError::InvalidInstant(format!(
                "Invalid time '{}'. Expected: YYYY-MM-DDTHH:MM:SS with optional offset",
                input
            ))
        })?;
    ensure_supported_year(local.year(), input)?;
    Ok(TimeInput::Local(local))
}

fn ensure_supported_year(year: i32, input: &str) -> Result<()> {
    if SUPPORTED_YEARS.contains(&year) {
        Ok(())
    } else {
        Err(TzClockError::InvalidInstant(format!(
            "Time '{}' is outside the supported years {}..={}",
            input.trim(),
            SUPPORTED_YEARS.start(),
            SUPPORTED_YEARS.end()
        )))
    }
}

/// Parse an absolute instant, auto-detecting the format.
///
/// Order of attempts:
/// 1. RFC3339 (if it contains 'T', 'Z' or '+')
/// 2. Epoch milliseconds (if the number is large enough)
/// 3. Epoch seconds
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    let instant = parse_any_instant(input)?;
    ensure_supported_year(instant.year(), input)?;
    Ok(instant)
}

fn parse_any_instant(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();

    if trimmed.contains('T') || trimmed.contains('Z') || trimmed.contains('+') {
        return parse_rfc3339(trimmed);
    }

    if let Ok(num) = trimmed.parse::<i64>() {
        // Heuristic: if the number is > 10^10, it's probably milliseconds
        if num.abs() > 10_000_000_000 {
            return parse_epoch_ms(num);
        } else {
            return parse_epoch_s(num);
        }
    }

    Err(TzClockError::InvalidInstant(format!(
        "Could not read '{}' as RFC3339 or epoch time",
        input
    )))
}

fn parse_epoch_ms(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
        TzClockError::InvalidInstant(format!("Epoch milliseconds out of range: {}", ms))
    })
}

fn parse_epoch_s(s: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(s, 0)
        .single()
        .ok_or_else(|| TzClockError::InvalidInstant(format!("Epoch seconds out of range: {}", s)))
}

fn parse_rfc3339(input: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            TzClockError::InvalidInstant(format!(
                "Invalid RFC3339 timestamp: '{}'. Error: {}",
                input, e
            ))
        })
}
