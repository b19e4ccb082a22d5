//! Zone oracle: the source of timezone rules.
//!
//! The rest of the crate never looks at rule data directly. It asks an
//! implementation of [`ZoneOracle`] three questions: does a zone exist,
//! what is its offset and DST flag at an instant, and which zones exist.
//!
//! - [`ChronoTzOracle`] answers from the IANA database compiled into
//!   `chrono-tz`.
//! - [`ScheduledOracle`] answers from hand-written transition schedules and
//!   counts its lookups, for deterministic tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, TZ_VARIANTS, Tz};
use serde::Serialize;

use crate::error::{Result, TzClockError};
use crate::tz::parse_tz;

/// UTC offset and DST flag valid for one (zone, instant) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DstState {
    /// Total offset from UTC in minutes, DST included.
    pub utc_offset_minutes: i32,
    /// Whether daylight saving time is in effect.
    pub is_dst: bool,
}

/// Capability interface over a timezone rule source.
pub trait ZoneOracle: Send + Sync {
    /// Whether `zone` names a zone this oracle can answer for.
    fn is_known_zone(&self, zone: &str) -> bool;

    /// Offset and DST flag of `zone` at `instant`.
    fn offset_and_dst(&self, zone: &str, instant: DateTime<Utc>) -> Result<DstState>;

    /// Every known zone identifier, in a stable order.
    fn list_known_zones(&self) -> Vec<String>;

    /// Shorthand for the DST flag alone.
    fn is_dst(&self, zone: &str, instant: DateTime<Utc>) -> Result<bool> {
        Ok(self.offset_and_dst(zone, instant)?.is_dst)
    }

    /// Fails with [`TzClockError::InvalidZone`] unless `zone` is known.
    fn ensure_known(&self, zone: &str) -> Result<()> {
        if self.is_known_zone(zone) {
            Ok(())
        } else {
            Err(TzClockError::InvalidZone(zone.to_string()))
        }
    }
}

/// Spacing of the samples taken around an instant with zero DST saving.
const NEGATIVE_SAVE_STRIDE: Duration = Duration::days(14);

/// Samples on each side; together they cover half a year either way.
const NEGATIVE_SAVE_SAMPLES: i32 = 13;

/// Oracle backed by the IANA database bundled with `chrono-tz`.
///
/// Some zones (Europe/Dublin) are encoded with their summer offset as
/// standard time and a negative saving in winter. For those the flag is
/// reported the conventional way round: the negative-saving period is
/// standard time, and the higher offset outside it is DST.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoTzOracle;

impl ChronoTzOracle {
    pub fn new() -> Self {
        Self
    }

    /// Whether a negative-saving period with a lower offset lies within half
    /// a year of `instant`.
    fn near_negative_save(tz: Tz, instant: DateTime<Utc>, offset_seconds: i32) -> bool {
        (-NEGATIVE_SAVE_SAMPLES..=NEGATIVE_SAVE_SAMPLES)
            .filter(|i| *i != 0)
            .filter_map(|i| instant.checked_add_signed(NEGATIVE_SAVE_STRIDE * i))
            .any(|sample| {
                let offset = tz.offset_from_utc_datetime(&sample.naive_utc());
                offset.dst_offset() < Duration::zero()
                    && offset.fix().local_minus_utc() < offset_seconds
            })
    }
}

impl ZoneOracle for ChronoTzOracle {
    fn is_known_zone(&self, zone: &str) -> bool {
        zone.parse::<Tz>().is_ok()
    }

    fn offset_and_dst(&self, zone: &str, instant: DateTime<Utc>) -> Result<DstState> {
        let tz = parse_tz(zone)?;
        let offset = tz.offset_from_utc_datetime(&instant.naive_utc());
        let offset_seconds = offset.fix().local_minus_utc();
        let saving = offset.dst_offset();

        let is_dst = if saving > Duration::zero() {
            true
        } else if saving < Duration::zero() {
            false
        } else {
            Self::near_negative_save(tz, instant, offset_seconds)
        };

        Ok(DstState {
            utc_offset_minutes: offset_seconds / 60,
            is_dst,
        })
    }

    fn list_known_zones(&self) -> Vec<String> {
        let mut zones: Vec<String> = TZ_VARIANTS.iter().map(|tz| tz.name().to_string()).collect();
        zones.sort();
        zones
    }
}

/// A synthetic zone: a standard offset plus instants at which DST flips.
#[derive(Debug, Clone)]
struct Schedule {
    standard_offset_minutes: i32,
    dst_shift_minutes: i32,
    /// Sorted. DST is off before the first flip and toggles at each one.
    flips: Vec<DateTime<Utc>>,
    failing: bool,
}

/// Deterministic oracle driven by explicit transition schedules.
#[derive(Debug, Default)]
pub struct ScheduledOracle {
    zones: BTreeMap<String, Schedule>,
    lookups: AtomicUsize,
}

impl ScheduledOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone that never observes DST.
    pub fn with_fixed_zone(self, name: &str, offset_minutes: i32) -> Self {
        self.with_zone(name, offset_minutes, 0, Vec::new())
    }

    /// Add a zone whose DST flag toggles at each instant in `flips`.
    ///
    /// While DST is on, the offset is `standard_offset_minutes + dst_shift_minutes`.
    pub fn with_zone(
        mut self,
        name: &str,
        standard_offset_minutes: i32,
        dst_shift_minutes: i32,
        mut flips: Vec<DateTime<Utc>>,
    ) -> Self {
        flips.sort();
        self.zones.insert(
            name.to_string(),
            Schedule {
                standard_offset_minutes,
                dst_shift_minutes,
                flips,
                failing: false,
            },
        );
        self
    }

    /// Add a zone that is listed and known but whose lookups always fail.
    pub fn with_failing_zone(mut self, name: &str) -> Self {
        self.zones.insert(
            name.to_string(),
            Schedule {
                standard_offset_minutes: 0,
                dst_shift_minutes: 0,
                flips: Vec::new(),
                failing: true,
            },
        );
        self
    }

    /// Number of `offset_and_dst` calls answered so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl ZoneOracle for ScheduledOracle {
    fn is_known_zone(&self, zone: &str) -> bool {
        self.zones.contains_key(zone)
    }

    fn offset_and_dst(&self, zone: &str, instant: DateTime<Utc>) -> Result<DstState> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let schedule = self
            .zones
            .get(zone)
            .ok_or_else(|| TzClockError::InvalidZone(zone.to_string()))?;

        if schedule.failing {
            return Err(TzClockError::OracleFailure(format!(
                "no rule data for {zone}"
            )));
        }

        let passed = schedule.flips.partition_point(|flip| *flip <= instant);
        let is_dst = passed % 2 == 1;
        let shift = if is_dst { schedule.dst_shift_minutes } else { 0 };

        Ok(DstState {
            utc_offset_minutes: schedule.standard_offset_minutes + shift,
            is_dst,
        })
    }

    fn list_known_zones(&self) -> Vec<String> {
        self.zones.keys().cloned().collect()
    }
}
