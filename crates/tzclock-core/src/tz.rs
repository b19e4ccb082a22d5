//! Timezone handling utilities.
//!
//! Parsing of IANA zone names plus the formatting helpers shared by the
//! report builders. Rendering goes through a fixed UTC offset so that any
//! oracle, not only chrono-tz, can drive it.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, TzClockError};

/// Parse an IANA timezone name into a [`chrono_tz::Tz`].
///
/// # Examples
///
/// ```
/// use tzclock_core::tz::parse_tz;
///
/// let tz = parse_tz("Europe/London").unwrap();
/// assert_eq!(tz.to_string(), "Europe/London");
/// ```
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| TzClockError::InvalidZone(name.to_string()))
}

/// Build the fixed offset for a UTC offset expressed in minutes.
pub fn fixed_offset(offset_minutes: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
        TzClockError::OracleFailure(format!("UTC offset out of range: {offset_minutes} minutes"))
    })
}

/// Render a UTC instant at the given offset.
pub fn at_offset(instant: DateTime<Utc>, offset_minutes: i32) -> Result<DateTime<FixedOffset>> {
    Ok(instant.with_timezone(&fixed_offset(offset_minutes)?))
}

/// Format a UTC offset in minutes as `+HH:MM` / `-HH:MM`.
///
/// ```
/// use tzclock_core::tz::format_utc_offset;
///
/// assert_eq!(format_utc_offset(60), "+01:00");
/// assert_eq!(format_utc_offset(-210), "-03:30");
/// assert_eq!(format_utc_offset(0), "+00:00");
/// ```
pub fn format_utc_offset(offset_minutes: i32) -> String {
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let abs = offset_minutes.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}

/// Format a datetime as RFC3339 with timezone offset.
///
/// An RFC3339 formatted string (e.g., "2025-10-19T18:00:00+01:00").
pub fn format_rfc3339<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Format a UTC datetime as RFC3339 with Z suffix.
pub fn format_rfc3339_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Format the local wall-clock part of a datetime as `YYYY-MM-DD HH:MM:SS`.
pub fn format_wall_clock<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
