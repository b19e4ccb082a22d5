//! Error types for tzclock-core.
//!
//! Every variant is terminal for the request that produced it. Nothing in
//! the library retries; the queries are read-only, so retrying is left to
//! the caller.

use thiserror::Error;

/// The main error type for tzclock operations.
#[derive(Debug, Error)]
pub enum TzClockError {
    /// Zone identifier unknown to the zone oracle.
    #[error("Invalid timezone: {0}")]
    InvalidZone(String),

    /// Time string that cannot be read as a calendar timestamp.
    #[error("Invalid time: {0}")]
    InvalidInstant(String),

    /// The client used up its request allowance for the current window.
    #[error("Rate limit exceeded for {client}, retry in {retry_after_secs}s")]
    RateLimitExceeded {
        client: String,
        retry_after_secs: u64,
    },

    /// The zone oracle could not answer.
    #[error("Oracle failure: {0}")]
    OracleFailure(String),

    /// Rejected configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TzClockError {
    /// Stable snake_case name of the error kind, used in error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            TzClockError::InvalidZone(_) => "invalid_zone",
            TzClockError::InvalidInstant(_) => "invalid_instant",
            TzClockError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            TzClockError::OracleFailure(_) => "oracle_failure",
            TzClockError::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Whether the error was caused by the request rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, TzClockError::OracleFailure(_))
    }
}

/// Result type alias for tzclock operations.
pub type Result<T> = std::result::Result<T, TzClockError>;
