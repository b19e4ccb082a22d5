//! Zone-to-zone conversion.
//!
//! A local wall-clock time only means something together with a zone, and
//! near a DST transition it may mean zero or two instants. The resolution
//! below asks the oracle for the offsets on either side of the naive time
//! and keeps every offset that the oracle confirms at the instant it
//! produces.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::error::{Result, TzClockError};
use crate::models::{AmbiguousPolicy, ConversionReport, LocalResolution, NonexistentPolicy, Policy};
use crate::oracle::ZoneOracle;
use crate::parse::{TimeInput, parse_time_input};
use crate::tz::{at_offset, format_rfc3339, format_rfc3339_utc, format_utc_offset};

/// Distance either side of a naive time at which offsets are sampled.
/// Must not exceed the minimum gap between two transitions.
const SAMPLE_DISTANCE: Duration = Duration::days(1);

/// Convert `input`, read in zone `from`, into zone `to`.
///
/// # Examples
///
/// ```
/// use tzclock_core::convert::convert;
/// use tzclock_core::models::Policy;
/// use tzclock_core::oracle::ChronoTzOracle;
///
/// let report = convert(
///     &ChronoTzOracle,
///     "Europe/London",
///     "America/New_York",
///     "2025-07-01 12:00",
///     Policy::default(),
/// )
/// .unwrap();
///
/// assert_eq!(report.converted_formatted, "2025-07-01T07:00:00-04:00");
/// ```
pub fn convert(
    oracle: &dyn ZoneOracle,
    from: &str,
    to: &str,
    input: &str,
    policy: Policy,
) -> Result<ConversionReport> {
    oracle.ensure_known(from)?;
    oracle.ensure_known(to)?;

    let (instant, resolution) = match parse_time_input(input)? {
        TimeInput::Absolute(instant) => (instant, LocalResolution::ExplicitOffset),
        TimeInput::Local(local) => resolve_local(oracle, from, local, policy)?,
    };

    let source = oracle.offset_and_dst(from, instant)?;
    let target = oracle.offset_and_dst(to, instant)?;

    Ok(ConversionReport {
        from: from.to_string(),
        to: to.to_string(),
        input: input.trim().to_string(),
        input_formatted: format_rfc3339(&at_offset(instant, source.utc_offset_minutes)?),
        utc: format_rfc3339_utc(&instant),
        converted_formatted: format_rfc3339(&at_offset(instant, target.utc_offset_minutes)?),
        is_dst_in_target: target.is_dst,
        target_utc_offset: format_utc_offset(target.utc_offset_minutes),
        resolution,
    })
}

/// Pin a wall-clock time in `zone` to an instant.
pub fn resolve_local(
    oracle: &dyn ZoneOracle,
    zone: &str,
    local: NaiveDateTime,
    policy: Policy,
) -> Result<(DateTime<Utc>, LocalResolution)> {
    let wall = local.and_utc();
    let before = oracle
        .offset_and_dst(zone, shifted(wall, -SAMPLE_DISTANCE, local)?)?
        .utc_offset_minutes;
    let after = oracle
        .offset_and_dst(zone, shifted(wall, SAMPLE_DISTANCE, local)?)?
        .utc_offset_minutes;

    let mut candidates: Vec<DateTime<Utc>> = Vec::with_capacity(2);
    for offset in [before, after] {
        let candidate = shifted(wall, -Duration::minutes(i64::from(offset)), local)?;
        if !candidates.contains(&candidate)
            && oracle.offset_and_dst(zone, candidate)?.utc_offset_minutes == offset
        {
            candidates.push(candidate);
        }
    }
    candidates.sort();

    match candidates.as_slice() {
        [single] => Ok((*single, LocalResolution::Normal)),
        [first, .., last] => match policy.ambiguous {
            AmbiguousPolicy::First => Ok((*first, LocalResolution::Ambiguous)),
            AmbiguousPolicy::Second => Ok((*last, LocalResolution::Ambiguous)),
            AmbiguousPolicy::Error => Err(TzClockError::InvalidInstant(format!(
                "Ambiguous time '{}' in timezone '{}'. Occurs twice due to DST fall back.",
                local.format("%Y-%m-%dT%H:%M:%S"),
                zone
            ))),
        },
        [] => match policy.nonexistent {
            // Reading the wall time with the pre-gap offset lands past the
            // gap by the same distance the input sat inside it.
            NonexistentPolicy::ShiftForward => Ok((
                shifted(wall, -Duration::minutes(i64::from(before)), local)?,
                LocalResolution::Nonexistent,
            )),
            NonexistentPolicy::Error => Err(TzClockError::InvalidInstant(format!(
                "Nonexistent time '{}' in timezone '{}'. Skipped due to DST spring forward.",
                local.format("%Y-%m-%dT%H:%M:%S"),
                zone
            ))),
        },
    }
}

fn shifted(instant: DateTime<Utc>, by: Duration, local: NaiveDateTime) -> Result<DateTime<Utc>> {
    instant.checked_add_signed(by).ok_or_else(|| {
        TzClockError::InvalidInstant(format!(
            "Time '{}' is too close to the end of the representable range",
            local.format("%Y-%m-%dT%H:%M:%S")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{ChronoTzOracle, ScheduledOracle};
    use chrono::{NaiveDate, TimeZone};

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().unwrap()
    }

    #[test]
    fn utc_to_tokyo() {
        let report = convert(
            &ChronoTzOracle,
            "UTC",
            "Asia/Tokyo",
            "2025-10-19T14:00:00Z",
            Policy::default(),
        )
        .unwrap();

        assert_eq!(report.converted_formatted, "2025-10-19T23:00:00+09:00");
        assert!(report.converted_formatted.ends_with("+09:00"));
        assert!(!report.is_dst_in_target);
        assert_eq!(report.target_utc_offset, "+09:00");
        assert_eq!(report.utc, "2025-10-19T14:00:00Z");
    }

    #[test]
    fn local_input_uses_source_offset() {
        // Same wall clock, different instants depending on the source zone
        let london = convert(
            &ChronoTzOracle,
            "Europe/London",
            "UTC",
            "2025-07-01T12:00:00",
            Policy::default(),
        )
        .unwrap();
        let tokyo = convert(
            &ChronoTzOracle,
            "Asia/Tokyo",
            "UTC",
            "2025-07-01T12:00:00",
            Policy::default(),
        )
        .unwrap();

        assert_eq!(london.utc, "2025-07-01T11:00:00Z");
        assert_eq!(london.input_formatted, "2025-07-01T12:00:00+01:00");
        assert_eq!(london.resolution, LocalResolution::Normal);
        assert_eq!(tokyo.utc, "2025-07-01T03:00:00Z");
    }

    #[test]
    fn dst_in_target() {
        let report = convert(
            &ChronoTzOracle,
            "Asia/Tokyo",
            "Europe/Berlin",
            "2025-07-01 09:00",
            Policy::default(),
        )
        .unwrap();

        assert!(report.is_dst_in_target);
        assert_eq!(report.converted_formatted, "2025-07-01T02:00:00+02:00");
    }

    #[test]
    fn round_trip_recovers_instant() {
        let there = convert(
            &ChronoTzOracle,
            "America/New_York",
            "Australia/Sydney",
            "2025-11-02T12:34:56",
            Policy::default(),
        )
        .unwrap();
        let back = convert(
            &ChronoTzOracle,
            "Australia/Sydney",
            "America/New_York",
            &there.converted_formatted,
            Policy::default(),
        )
        .unwrap();

        assert_eq!(there.utc, back.utc);
        assert_eq!(back.converted_formatted, "2025-11-02T12:34:56-05:00");
    }

    #[test]
    fn round_trip_through_local_wall_clock() {
        let there = convert(
            &ChronoTzOracle,
            "Europe/London",
            "Asia/Kolkata",
            "2025-03-30 00:30",
            Policy::default(),
        )
        .unwrap();
        let wall_clock = there.converted_formatted.trim_end_matches("+05:30");
        let back = convert(
            &ChronoTzOracle,
            "Asia/Kolkata",
            "Europe/London",
            wall_clock,
            Policy::default(),
        )
        .unwrap();

        assert_eq!(there.utc, back.utc);
    }

    #[test]
    fn ambiguous_time_policies() {
        // 01:30 happens twice in London on 2025-10-26
        let local = naive(2025, 10, 26, 1, 30);

        let first = resolve_local(&ChronoTzOracle, "Europe/London", local, Policy::default()).unwrap();
        assert_eq!(first, (utc(2025, 10, 26, 0, 30), LocalResolution::Ambiguous));

        let second_policy = Policy {
            ambiguous: AmbiguousPolicy::Second,
            ..Policy::default()
        };
        let second = resolve_local(&ChronoTzOracle, "Europe/London", local, second_policy).unwrap();
        assert_eq!(second.0, utc(2025, 10, 26, 1, 30));

        let strict = Policy {
            ambiguous: AmbiguousPolicy::Error,
            ..Policy::default()
        };
        assert!(matches!(
            resolve_local(&ChronoTzOracle, "Europe/London", local, strict),
            Err(TzClockError::InvalidInstant(_))
        ));
    }

    #[test]
    fn nonexistent_time_shifts_forward() {
        // 01:30 is skipped in London on 2025-03-30; it becomes 02:30 BST
        let report = convert(
            &ChronoTzOracle,
            "Europe/London",
            "UTC",
            "2025-03-30T01:30:00",
            Policy::default(),
        )
        .unwrap();

        assert_eq!(report.resolution, LocalResolution::Nonexistent);
        assert_eq!(report.utc, "2025-03-30T01:30:00Z");
        assert_eq!(report.input_formatted, "2025-03-30T02:30:00+01:00");
    }

    #[test]
    fn nonexistent_time_with_error_policy() {
        let strict = Policy {
            nonexistent: NonexistentPolicy::Error,
            ..Policy::default()
        };
        let result = convert(
            &ChronoTzOracle,
            "Europe/London",
            "UTC",
            "2025-03-30T01:30:00",
            strict,
        );

        assert!(matches!(result, Err(TzClockError::InvalidInstant(_))));
    }

    #[test]
    fn unknown_zones_rejected_before_parsing() {
        let from = convert(&ChronoTzOracle, "Not/AZone", "UTC", "garbage", Policy::default());
        assert!(matches!(from, Err(TzClockError::InvalidZone(z)) if z == "Not/AZone"));

        let to = convert(&ChronoTzOracle, "UTC", "Mars/Olympus", "2025-01-01T00:00", Policy::default());
        assert!(matches!(to, Err(TzClockError::InvalidZone(z)) if z == "Mars/Olympus"));
    }

    #[test]
    fn unparsable_time() {
        let result = convert(&ChronoTzOracle, "UTC", "Asia/Tokyo", "half past noon", Policy::default());
        assert!(matches!(result, Err(TzClockError::InvalidInstant(_))));
    }

    #[test]
    fn synthetic_gap_and_overlap() {
        let oracle = ScheduledOracle::new().with_zone(
            "Test/Seasonal",
            0,
            60,
            vec![utc(2030, 3, 31, 1, 0), utc(2030, 10, 27, 1, 0)],
        );

        let gap = resolve_local(&oracle, "Test/Seasonal", naive(2030, 3, 31, 1, 15), Policy::default())
            .unwrap();
        assert_eq!(gap, (utc(2030, 3, 31, 1, 15), LocalResolution::Nonexistent));

        let overlap =
            resolve_local(&oracle, "Test/Seasonal", naive(2030, 10, 27, 1, 15), Policy::default())
                .unwrap();
        assert_eq!(overlap, (utc(2030, 10, 27, 0, 15), LocalResolution::Ambiguous));

        let plain = resolve_local(&oracle, "Test/Seasonal", naive(2030, 6, 1, 12, 0), Policy::default())
            .unwrap();
        assert_eq!(plain, (utc(2030, 6, 1, 11, 0), LocalResolution::Normal));
    }

    #[test]
    fn extreme_years_are_invalid_instants() {
        for input in ["+262142-12-31T12:00", "-262143-01-01T12:00"] {
            let result = convert(&ChronoTzOracle, "UTC", "Asia/Tokyo", input, Policy::default());
            assert!(
                matches!(result, Err(TzClockError::InvalidInstant(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn resolving_at_the_ends_of_time_does_not_overflow() {
        let oracle = ScheduledOracle::new().with_fixed_zone("Test/Fixed", 0);
        for local in [NaiveDateTime::MAX, NaiveDateTime::MIN] {
            let result = resolve_local(&oracle, "Test/Fixed", local, Policy::default());
            assert!(matches!(result, Err(TzClockError::InvalidInstant(_))));
        }
    }
}
