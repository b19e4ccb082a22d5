//! Time report construction.

use chrono::{DateTime, Timelike, Utc};

use crate::error::Result;
use crate::finder::TransitionFinder;
use crate::models::TimeReport;
use crate::oracle::ZoneOracle;
use crate::tz::{at_offset, format_rfc3339, format_rfc3339_utc, format_utc_offset, format_wall_clock};

/// Build the [`TimeReport`] of `zone` at instant `at`.
///
/// The instant is truncated to whole seconds. The next DST change is
/// searched within the finder's horizon.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tzclock_core::finder::TransitionFinder;
/// use tzclock_core::oracle::ChronoTzOracle;
/// use tzclock_core::report::time_report;
///
/// let at = Utc.with_ymd_and_hms(2025, 10, 19, 17, 0, 0).single().unwrap();
/// let report = time_report(&ChronoTzOracle, &TransitionFinder::default(), "Europe/London", at).unwrap();
///
/// assert!(report.is_dst);
/// assert_eq!(report.utc_offset, "+01:00");
/// ```
pub fn time_report(
    oracle: &dyn ZoneOracle,
    finder: &TransitionFinder,
    zone: &str,
    at: DateTime<Utc>,
) -> Result<TimeReport> {
    oracle.ensure_known(zone)?;

    let at = at.with_nanosecond(0).unwrap_or(at);
    let state = oracle.offset_and_dst(zone, at)?;
    let local = at_offset(at, state.utc_offset_minutes)?;
    let utc_offset = format_utc_offset(state.utc_offset_minutes);
    let next_change = finder.find_next(oracle, zone, at)?;

    Ok(TimeReport {
        zone: zone.to_string(),
        utc: format_rfc3339_utc(&at),
        datetime: format_rfc3339(&local),
        formatted: format_wall_clock(&local),
        unix_timestamp: at.timestamp(),
        day_of_week: local.format("%A").to_string(),
        is_dst: state.is_dst,
        dst_offset: state.is_dst.then(|| utc_offset.clone()),
        next_dst_change: next_change.map(|t| format_rfc3339_utc(&t)),
        utc_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TzClockError;
    use crate::oracle::{ChronoTzOracle, ScheduledOracle};
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().unwrap()
    }

    #[test]
    fn london_before_autumn_change() {
        let report = time_report(
            &ChronoTzOracle,
            &TransitionFinder::default(),
            "Europe/London",
            utc(2025, 10, 19, 17, 0),
        )
        .unwrap();

        assert_eq!(report.zone, "Europe/London");
        assert!(report.is_dst);
        assert_eq!(report.utc_offset, "+01:00");
        assert_eq!(report.dst_offset.as_deref(), Some("+01:00"));
        assert_eq!(report.datetime, "2025-10-19T18:00:00+01:00");
        assert_eq!(report.formatted, "2025-10-19 18:00:00");
        assert_eq!(report.day_of_week, "Sunday");
        assert_eq!(report.unix_timestamp, 1_760_893_200);
        assert_eq!(report.next_dst_change.as_deref(), Some("2025-10-26T01:00:00Z"));
    }

    #[test]
    fn fixed_offset_zone_never_reports_dst() {
        let oracle = ScheduledOracle::new().with_fixed_zone("Test/Fixed", -150);
        for day in [1, 90, 180, 270] {
            let at = utc(2030, 1, 1, 0, 0) + chrono::Duration::days(day);
            let report = time_report(&oracle, &TransitionFinder::default(), "Test/Fixed", at).unwrap();
            assert!(!report.is_dst);
            assert_eq!(report.dst_offset, None);
            assert_eq!(report.next_dst_change, None);
            assert_eq!(report.utc_offset, "-02:30");
        }
    }

    #[test]
    fn etc_zone_has_no_dst() {
        let report = time_report(
            &ChronoTzOracle,
            &TransitionFinder::default(),
            "Etc/GMT-14",
            utc(2025, 10, 19, 17, 0),
        )
        .unwrap();

        assert!(!report.is_dst);
        assert_eq!(report.utc_offset, "+14:00");
        assert_eq!(report.next_dst_change, None);
        assert_eq!(report.day_of_week, "Monday");
    }

    #[test]
    fn subsecond_precision_is_dropped() {
        let at = utc(2025, 10, 19, 17, 0) + chrono::Duration::milliseconds(750);
        let report = time_report(&ChronoTzOracle, &TransitionFinder::default(), "UTC", at).unwrap();
        assert_eq!(report.utc, "2025-10-19T17:00:00Z");
        assert_eq!(report.unix_timestamp, 1_760_893_200);
    }

    #[test]
    fn unknown_zone() {
        let result = time_report(
            &ChronoTzOracle,
            &TransitionFinder::default(),
            "Not/AZone",
            utc(2025, 10, 19, 17, 0),
        );
        assert!(matches!(result, Err(TzClockError::InvalidZone(_))));
    }
}
