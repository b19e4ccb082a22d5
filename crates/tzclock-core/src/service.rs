//! Request flow shared by every front end.
//!
//! Each query is admitted, keyed, looked up in the cache and computed only
//! on a miss. Failed computations are never cached. The service owns its
//! cache and admission state, so independent instances never interfere.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::admission::AdmissionControl;
use crate::cache::{CacheKey, ResponseCache};
use crate::clock::Clock;
use crate::config::Config;
use crate::convert::convert;
use crate::error::{Result, TzClockError};
use crate::finder::TransitionFinder;
use crate::models::{ConversionReport, Health, Policy, TimeReport};
use crate::oracle::ZoneOracle;
use crate::report::time_report;
use crate::tz::format_rfc3339_utc;

/// A cached response of any endpoint.
#[derive(Debug, Clone)]
pub enum CachedResponse {
    Time(TimeReport),
    Conversion(ConversionReport),
    Zones(Arc<Vec<String>>),
}

/// Cache, admission control and computations behind one handle.
pub struct ClockService {
    oracle: Arc<dyn ZoneOracle>,
    clock: Arc<dyn Clock>,
    finder: TransitionFinder,
    cache: ResponseCache<CachedResponse>,
    admission: AdmissionControl,
    config: Config,
    started_at: DateTime<Utc>,
}

impl ClockService {
    pub fn new(oracle: Arc<dyn ZoneOracle>, clock: Arc<dyn Clock>, config: Config) -> Result<Self> {
        config.validate()?;

        let admission = AdmissionControl::new(config.window, config.max_requests, clock.clone())?;
        let cache = ResponseCache::new(clock.clone());
        let started_at = clock.now();

        Ok(Self {
            oracle,
            clock,
            finder: TransitionFinder::default(),
            cache,
            admission,
            config,
            started_at,
        })
    }

    /// Replace the transition finder.
    pub fn with_finder(mut self, finder: TransitionFinder) -> Self {
        self.finder = finder;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache<CachedResponse> {
        &self.cache
    }

    pub fn admission(&self) -> &AdmissionControl {
        &self.admission
    }

    /// Current time report of `zone`.
    pub fn time(&self, client: &str, zone: &str) -> Result<TimeReport> {
        self.admission.check(client)?;

        let key = CacheKey::time(zone);
        if let Some(CachedResponse::Time(report)) = self.cache.get(&key) {
            return Ok(report);
        }

        tracing::debug!(%key, "cache miss");
        let report = time_report(self.oracle.as_ref(), &self.finder, zone, self.clock.now())
            .inspect_err(log_failure)?;
        self.cache
            .put(key, CachedResponse::Time(report.clone()), self.config.time_ttl);
        Ok(report)
    }

    /// Every zone the oracle knows.
    pub fn timezones(&self, client: &str) -> Result<Arc<Vec<String>>> {
        self.admission.check(client)?;

        let key = CacheKey::timezones();
        if let Some(CachedResponse::Zones(zones)) = self.cache.get(&key) {
            return Ok(zones);
        }

        tracing::debug!(%key, "cache miss");
        let zones = Arc::new(self.oracle.list_known_zones());
        self.cache.put(
            key,
            CachedResponse::Zones(Arc::clone(&zones)),
            self.config.zones_ttl,
        );
        Ok(zones)
    }

    /// Convert `time`, read in `from`, into `to`.
    pub fn convert(
        &self,
        client: &str,
        from: &str,
        to: &str,
        time: &str,
        policy: Policy,
    ) -> Result<ConversionReport> {
        self.admission.check(client)?;

        let key = CacheKey::convert(from, to, time, policy);
        if let Some(CachedResponse::Conversion(report)) = self.cache.get(&key) {
            return Ok(report);
        }

        tracing::debug!(%key, "cache miss");
        let report = convert(self.oracle.as_ref(), from, to, time, policy).inspect_err(log_failure)?;
        self.cache.put(
            key,
            CachedResponse::Conversion(report.clone()),
            self.config.time_ttl,
        );
        Ok(report)
    }

    /// Liveness. Not subject to admission control.
    pub fn health(&self) -> Health {
        let now = self.clock.now();
        Health {
            status: "ok",
            time: format_rfc3339_utc(&now),
            uptime_seconds: (now - self.started_at).num_seconds(),
        }
    }
}

fn log_failure(err: &TzClockError) {
    if err.is_client_error() {
        tracing::debug!(error = %err, "request rejected");
    } else {
        tracing::error!(error = %err, "zone oracle failure");
    }
}
