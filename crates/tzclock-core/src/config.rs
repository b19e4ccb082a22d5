//! Runtime configuration.

use chrono::Duration;

use crate::admission::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};
use crate::error::{Result, TzClockError};

/// Settings for a [`ClockService`](crate::service::ClockService) and the
/// server around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TTL of `/time` and `/convert` responses.
    pub time_ttl: Duration,
    /// TTL of the zone list.
    pub zones_ttl: Duration,
    /// Admission window length.
    pub window: Duration,
    /// Requests allowed per client per window.
    pub max_requests: u32,
    /// Listening address.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Identify clients by the first `X-Forwarded-For` hop instead of the
    /// peer address. Only safe behind a proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_ttl: Duration::seconds(10),
            zones_ttl: Duration::seconds(60),
            window: DEFAULT_WINDOW,
            max_requests: DEFAULT_MAX_REQUESTS,
            host: "0.0.0.0".to_string(),
            port: 3000,
            trust_forwarded_for: false,
        }
    }
}

impl Config {
    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.time_ttl < Duration::zero() || self.zones_ttl < Duration::zero() {
            return Err(TzClockError::InvalidConfig(
                "cache TTLs must not be negative".to_string(),
            ));
        }
        if self.window <= Duration::zero() {
            return Err(TzClockError::InvalidConfig(
                "admission window must be positive".to_string(),
            ));
        }
        if self.max_requests == 0 {
            return Err(TzClockError::InvalidConfig(
                "max requests per window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.time_ttl, Duration::seconds(10));
        assert_eq!(config.zones_ttl, Duration::seconds(60));
        assert_eq!(config.window, Duration::seconds(60));
        assert_eq!(config.max_requests, 120);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(!config.trust_forwarded_for);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let config = Config {
            max_requests: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TzClockError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_ttl_disables_caching_but_is_valid() {
        let config = Config {
            time_ttl: Duration::zero(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
