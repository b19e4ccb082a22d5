//! Per-client request admission.
//!
//! A fixed-window counter: each client may make `max_requests` requests per
//! window. The window starts at the client's first request and restarts on
//! the first request after it lapses. Bursts across a window boundary can
//! reach twice the limit.
//!
//! Lapsed windows are swept out when a new client arrives and the table has
//! grown past its sweep mark, so the table tracks recent clients only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::error::{Result, TzClockError};

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::seconds(60);

/// Default requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 120;

/// Table size at which lapsed windows are first swept.
pub const SWEEP_THRESHOLD: usize = 1024;

/// Whether a client's window still applies at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// The window is running; its count is authoritative.
    Active,
    /// The window has lapsed; the next request starts a new one.
    Expired,
}

/// Request count of one client within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

impl ClientWindow {
    fn started_at(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    pub fn state(&self, now: DateTime<Utc>, window: Duration) -> WindowState {
        if now > self.window_start + window {
            WindowState::Expired
        } else {
            WindowState::Active
        }
    }

    fn resets_at(&self, window: Duration) -> DateTime<Utc> {
        self.window_start + window
    }
}

#[derive(Debug)]
struct ClientTable {
    windows: HashMap<String, ClientWindow>,
    /// Size at which the next new client triggers a sweep.
    sweep_at: usize,
}

impl ClientTable {
    fn new() -> Self {
        Self {
            windows: HashMap::new(),
            sweep_at: SWEEP_THRESHOLD,
        }
    }

    fn sweep(&mut self, now: DateTime<Utc>, window: Duration) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, client| client.state(now, window) == WindowState::Active);
        // Still full of live clients: back off so sweeps stay amortised.
        self.sweep_at = SWEEP_THRESHOLD.max(self.windows.len() * 2);
        before - self.windows.len()
    }
}

/// Fixed-window rate limiter keyed by client identity.
pub struct AdmissionControl {
    window: Duration,
    max_requests: u32,
    clients: Mutex<ClientTable>,
    clock: Arc<dyn Clock>,
}

impl AdmissionControl {
    pub fn new(window: Duration, max_requests: u32, clock: Arc<dyn Clock>) -> Result<Self> {
        if window <= Duration::zero() {
            return Err(TzClockError::InvalidConfig(format!(
                "admission window must be positive, got {window}"
            )));
        }
        if max_requests == 0 {
            return Err(TzClockError::InvalidConfig(
                "max requests per window must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            window,
            max_requests,
            clients: Mutex::new(ClientTable::new()),
            clock,
        })
    }

    /// Count a request from `client_id` and report whether it may proceed.
    pub fn admit(&self, client_id: &str) -> bool {
        self.check(client_id).is_ok()
    }

    /// Count a request from `client_id`, failing with
    /// [`TzClockError::RateLimitExceeded`] once the window is used up.
    ///
    /// Rejected requests are not counted.
    pub fn check(&self, client_id: &str) -> Result<()> {
        let now = self.clock.now();
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if !clients.windows.contains_key(client_id) && clients.windows.len() >= clients.sweep_at {
            let removed = clients.sweep(now, self.window);
            tracing::debug!(removed, tracked = clients.windows.len(), "swept lapsed client windows");
        }

        let entry = clients
            .windows
            .entry(client_id.to_string())
            .or_insert_with(|| ClientWindow::started_at(now));

        if entry.state(now, self.window) == WindowState::Expired {
            *entry = ClientWindow::started_at(now);
        }

        if entry.count >= self.max_requests {
            let remaining = entry.resets_at(self.window) - now;
            // Round up so a client waiting the advertised time is admitted.
            let retry_after_secs = (remaining.num_milliseconds().max(0) as u64).div_ceil(1000).max(1);
            tracing::warn!(client = client_id, retry_after_secs, "rate limit exceeded");
            return Err(TzClockError::RateLimitExceeded {
                client: client_id.to_string(),
                retry_after_secs,
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Drop windows that have lapsed, returning how many were removed.
    pub fn forget_expired(&self) -> usize {
        let now = self.clock.now();
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sweep(now, self.window)
    }

    /// Current window of `client_id`, if one is tracked.
    pub fn window_of(&self, client_id: &str) -> Option<ClientWindow> {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .get(client_id)
            .copied()
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .len()
    }
}
