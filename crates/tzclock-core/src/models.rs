//! Core data types for tzclock.
//!
//! - [`TimeReport`] - current time and DST status of one zone
//! - [`ConversionReport`] - one instant rendered in two zones
//! - [`NonexistentPolicy`] / [`AmbiguousPolicy`] / [`Policy`] - how local
//!   times inside a DST gap or overlap are resolved
//! - [`LocalResolution`] - which of those cases a conversion hit
//! - [`Health`] - liveness payload

use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, TzClockError};

/// Policy for handling nonexistent local times.
///
/// Nonexistent times occur during DST spring forward when a range
/// of local times is skipped (e.g., 01:00-01:59 in Europe/London).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NonexistentPolicy {
    /// Return an error for nonexistent times.
    Error,
    /// Move forward by the length of the gap, keeping the distance into it.
    #[default]
    ShiftForward,
}

impl FromStr for NonexistentPolicy {
    type Err = TzClockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(NonexistentPolicy::Error),
            "shift_forward" => Ok(NonexistentPolicy::ShiftForward),
            _ => Err(TzClockError::InvalidInstant(format!(
                "Invalid nonexistent policy '{}'. Expected: error, shift_forward",
                s
            ))),
        }
    }
}

impl std::fmt::Display for NonexistentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonexistentPolicy::Error => write!(f, "error"),
            NonexistentPolicy::ShiftForward => write!(f, "shift_forward"),
        }
    }
}

/// Policy for handling ambiguous local times.
///
/// Ambiguous times occur during DST fall back when a range
/// of local times occurs twice (e.g., 01:00-01:59 in Europe/London).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AmbiguousPolicy {
    /// Return an error for ambiguous times.
    Error,
    /// Use the first occurrence (earlier instant, still in DST).
    #[default]
    First,
    /// Use the second occurrence (later instant, back to standard time).
    Second,
}

impl FromStr for AmbiguousPolicy {
    type Err = TzClockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(AmbiguousPolicy::Error),
            "first" => Ok(AmbiguousPolicy::First),
            "second" => Ok(AmbiguousPolicy::Second),
            _ => Err(TzClockError::InvalidInstant(format!(
                "Invalid ambiguous policy '{}'. Expected: error, first, second",
                s
            ))),
        }
    }
}

impl std::fmt::Display for AmbiguousPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmbiguousPolicy::Error => write!(f, "error"),
            AmbiguousPolicy::First => write!(f, "first"),
            AmbiguousPolicy::Second => write!(f, "second"),
        }
    }
}

/// Combined DST handling policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Policy {
    /// How to handle nonexistent local times.
    pub nonexistent: NonexistentPolicy,
    /// How to handle ambiguous local times.
    pub ambiguous: AmbiguousPolicy,
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nonexistent={},ambiguous={}", self.nonexistent, self.ambiguous)
    }
}

/// How the input of a conversion was pinned to an absolute instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalResolution {
    /// The local time occurs exactly once.
    Normal,
    /// The local time occurs twice; the ambiguous policy picked one.
    Ambiguous,
    /// The local time was skipped; it was shifted forward.
    Nonexistent,
    /// The input carried its own UTC offset.
    ExplicitOffset,
}

impl std::fmt::Display for LocalResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalResolution::Normal => write!(f, "normal"),
            LocalResolution::Ambiguous => write!(f, "ambiguous"),
            LocalResolution::Nonexistent => write!(f, "nonexistent"),
            LocalResolution::ExplicitOffset => write!(f, "explicit_offset"),
        }
    }
}

/// Current time and DST status of a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeReport {
    /// IANA zone identifier.
    pub zone: String,
    /// The instant in UTC (RFC3339 with Z suffix).
    pub utc: String,
    /// The instant in local time with offset (RFC3339).
    pub datetime: String,
    /// Local wall clock, `YYYY-MM-DD HH:MM:SS`.
    pub formatted: String,
    /// Seconds since the Unix epoch.
    pub unix_timestamp: i64,
    /// Offset from UTC, `+HH:MM`.
    pub utc_offset: String,
    /// English weekday name in local time.
    pub day_of_week: String,
    /// Whether daylight saving time is in effect.
    pub is_dst: bool,
    /// The offset in effect while DST applies, `None` outside DST.
    pub dst_offset: Option<String>,
    /// Next instant the DST flag changes (RFC3339 with Z), if within the horizon.
    pub next_dst_change: Option<String>,
}

/// An instant read in one zone and rendered in another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Source zone.
    pub from: String,
    /// Target zone.
    pub to: String,
    /// Original input string.
    pub input: String,
    /// The resolved instant rendered in the source zone (RFC3339).
    pub input_formatted: String,
    /// The resolved instant in UTC (RFC3339 with Z).
    pub utc: String,
    /// The resolved instant rendered in the target zone (RFC3339).
    pub converted_formatted: String,
    /// Whether the target zone observes DST at that instant.
    pub is_dst_in_target: bool,
    /// Target zone offset at that instant, `+HH:MM`.
    pub target_utc_offset: String,
    /// How the input was pinned to an instant.
    pub resolution: LocalResolution,
}

/// Liveness payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    /// Current instant (RFC3339 with Z).
    pub time: String,
    pub uptime_seconds: i64,
}
