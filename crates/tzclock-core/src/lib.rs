//! # tzclock-core
//!
//! DST-aware world clock queries for Rust.
//!
//! This library answers three questions about civil time in an IANA
//! timezone: what time is it there and is DST in effect, when does the DST
//! status next change, and what is a given local time in another zone.
//!
//! ## Features
//!
//! - **Transition search**: coarse 6-hour scan followed by bisection to
//!   minute resolution, bounded to a 370-day horizon.
//! - **DST-safe conversion**: local wall-clock input is resolved in the
//!   source zone, with explicit policies for skipped and repeated times.
//! - **Pluggable rules**: everything runs against the [`ZoneOracle`] trait;
//!   [`ChronoTzOracle`] wraps the IANA database from chrono-tz.
//! - **Request layer**: a lazily expiring response cache and a fixed-window
//!   admission control, owned by a [`ClockService`] instance.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tzclock_core::prelude::*;
//!
//! let service = ClockService::new(
//!     Arc::new(ChronoTzOracle),
//!     Arc::new(SystemClock),
//!     Config::default(),
//! )
//! .unwrap();
//!
//! let report = service.time("127.0.0.1", "Asia/Tokyo").unwrap();
//! assert_eq!(report.utc_offset, "+09:00");
//! assert!(!report.is_dst);
//! ```

pub mod admission;
pub mod cache;
pub mod clock;
pub mod config;
pub mod convert;
pub mod error;
pub mod finder;
pub mod models;
pub mod oracle;
pub mod parse;
pub mod report;
pub mod service;
pub mod tz;

// Re-export commonly used types at the crate root
pub use admission::{AdmissionControl, ClientWindow, WindowState};
pub use cache::{CacheKey, Endpoint, ResponseCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use convert::convert;
pub use error::{Result, TzClockError};
pub use finder::{TransitionFinder, find_next_transition};
pub use models::{
    AmbiguousPolicy, ConversionReport, Health, LocalResolution, NonexistentPolicy, Policy,
    TimeReport,
};
pub use oracle::{ChronoTzOracle, DstState, ScheduledOracle, ZoneOracle};
pub use parse::{TimeInput, parse_instant, parse_time_input};
pub use report::time_report;
pub use service::{CachedResponse, ClockService};

/// Prelude module for convenient imports.
///
/// ```
/// use tzclock_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::config::Config;
    pub use crate::convert::convert;
    pub use crate::error::{Result, TzClockError};
    pub use crate::finder::{TransitionFinder, find_next_transition};
    pub use crate::models::*;
    pub use crate::oracle::{ChronoTzOracle, ZoneOracle};
    pub use crate::parse::{parse_instant, parse_time_input};
    pub use crate::report::time_report;
    pub use crate::service::ClockService;
    pub use crate::tz::parse_tz;
}
