//! DST transition search.
//!
//! Finds the next instant at which a zone's DST flag differs from its value
//! at a reference instant. The oracle only answers point queries, so the
//! search walks forward in coarse steps until the flag flips and then
//! bisects the bracketing interval down to the requested resolution.
//!
//! The scan step must stay strictly below the smallest gap between two
//! transitions in the oracle's rule data, otherwise a pair of flips inside
//! one step cancels out and is missed. Modern IANA rules never flip twice
//! within 24 hours, so the 6-hour default is safe for [`ChronoTzOracle`].
//!
//! [`ChronoTzOracle`]: crate::oracle::ChronoTzOracle

use std::time::Instant;

use chrono::{DateTime, Duration, DurationRound, Utc};

use crate::error::{Result, TzClockError};
use crate::oracle::ZoneOracle;

/// Default coarse scan step.
pub const DEFAULT_STEP: Duration = Duration::hours(6);

/// Default search horizon: a little over a year, so a full annual cycle is
/// covered even when the reference sits just after a transition.
pub const DEFAULT_HORIZON: Duration = Duration::days(370);

/// Longest horizon a search accepts.
pub const MAX_HORIZON: Duration = Duration::days(36_600);

/// Default bisection resolution.
pub const DEFAULT_RESOLUTION: Duration = Duration::minutes(1);

/// Default wall-clock budget for one search.
pub const DEFAULT_BUDGET: std::time::Duration = std::time::Duration::from_secs(2);

/// Coarse-scan-then-bisect transition search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionFinder {
    step: Duration,
    horizon: Duration,
    resolution: Duration,
    budget: std::time::Duration,
}

impl Default for TransitionFinder {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            horizon: DEFAULT_HORIZON,
            resolution: DEFAULT_RESOLUTION,
            budget: DEFAULT_BUDGET,
        }
    }
}

impl TransitionFinder {
    /// Create a finder with explicit search parameters.
    ///
    /// The step and resolution must be positive and the resolution may not
    /// exceed the step.
    pub fn new(step: Duration, horizon: Duration, resolution: Duration) -> Result<Self> {
        if step <= Duration::zero() {
            return Err(TzClockError::InvalidConfig(format!(
                "scan step must be positive, got {step}"
            )));
        }
        if resolution <= Duration::zero() || resolution > step {
            return Err(TzClockError::InvalidConfig(format!(
                "resolution must be positive and at most the scan step, got {resolution}"
            )));
        }
        check_horizon(horizon)?;

        Ok(Self {
            step,
            horizon,
            resolution,
            budget: DEFAULT_BUDGET,
        })
    }

    /// Replace the wall-clock budget for a single search.
    pub fn with_budget(mut self, budget: std::time::Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Next DST transition within the configured horizon.
    pub fn find_next(
        &self,
        oracle: &dyn ZoneOracle,
        zone: &str,
        reference: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        self.find_next_within(oracle, zone, reference, self.horizon)
    }

    /// Next DST transition strictly after `reference` and no later than
    /// `reference + horizon`.
    ///
    /// Returns `Ok(None)` when the flag never changes inside the horizon,
    /// which is the normal answer for zones without DST. The zone is not
    /// validated here; unknown zones surface whatever the oracle reports.
    pub fn find_next_within(
        &self,
        oracle: &dyn ZoneOracle,
        zone: &str,
        reference: DateTime<Utc>,
        horizon: Duration,
    ) -> Result<Option<DateTime<Utc>>> {
        check_horizon(horizon)?;

        let started = Instant::now();
        let baseline = oracle.is_dst(zone, reference)?;
        let end = reference
            .checked_add_signed(horizon)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut previous = reference;
        loop {
            let cursor = match previous.checked_add_signed(self.step) {
                Some(cursor) if cursor <= end => cursor,
                _ => {
                    tracing::debug!(zone, %reference, "no DST transition within horizon");
                    return Ok(None);
                }
            };
            self.check_budget(started, zone)?;

            if oracle.is_dst(zone, cursor)? != baseline {
                let transition = self.bisect(oracle, zone, baseline, previous, cursor, started)?;
                tracing::debug!(zone, %reference, %transition, "found DST transition");
                return Ok(Some(transition));
            }
            previous = cursor;
        }
    }

    /// Narrow `(lower, upper]` until it is no wider than the resolution.
    ///
    /// Invariant: the flag at `lower` equals `baseline`, the flag at `upper`
    /// does not.
    fn bisect(
        &self,
        oracle: &dyn ZoneOracle,
        zone: &str,
        baseline: bool,
        mut lower: DateTime<Utc>,
        mut upper: DateTime<Utc>,
        started: Instant,
    ) -> Result<DateTime<Utc>> {
        while upper - lower > self.resolution {
            self.check_budget(started, zone)?;

            let mid = lower + (upper - lower) / 2;
            if oracle.is_dst(zone, mid)? == baseline {
                lower = mid;
            } else {
                upper = mid;
            }
        }

        // Rule data switches on whole minutes; pull the bound onto one when
        // the bracket still holds.
        if let Ok(aligned) = upper.duration_trunc(Duration::minutes(1))
            && aligned > lower
            && aligned < upper
            && oracle.is_dst(zone, aligned)? != baseline
        {
            upper = aligned;
        }

        Ok(upper)
    }

    fn check_budget(&self, started: Instant, zone: &str) -> Result<()> {
        if started.elapsed() >= self.budget {
            tracing::warn!(zone, budget_ms = self.budget.as_millis() as u64, "transition search over budget");
            return Err(TzClockError::OracleFailure(format!(
                "transition search for {zone} exceeded {}ms",
                self.budget.as_millis()
            )));
        }
        Ok(())
    }
}

fn check_horizon(horizon: Duration) -> Result<()> {
    if horizon < Duration::zero() || horizon > MAX_HORIZON {
        return Err(TzClockError::InvalidConfig(format!(
            "horizon must be between 0 and {} days, got {} days",
            MAX_HORIZON.num_days(),
            horizon.num_days()
        )));
    }
    Ok(())
}

/// Find the next DST transition of `zone` after `reference` with the default
/// step, resolution and budget.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tzclock_core::finder::{DEFAULT_HORIZON, find_next_transition};
/// use tzclock_core::oracle::ChronoTzOracle;
///
/// let reference = Utc.with_ymd_and_hms(2025, 10, 19, 17, 0, 0).single().unwrap();
/// let next = find_next_transition(&ChronoTzOracle, "Europe/London", reference, DEFAULT_HORIZON)
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(next, Utc.with_ymd_and_hms(2025, 10, 26, 1, 0, 0).single().unwrap());
/// ```
pub fn find_next_transition(
    oracle: &dyn ZoneOracle,
    zone: &str,
    reference: DateTime<Utc>,
    horizon: Duration,
) -> Result<Option<DateTime<Utc>>> {
    TransitionFinder::default().find_next_within(oracle, zone, reference, horizon)
}
