//! Time-bounded response cache.
//!
//! Entries expire lazily: a read past `expires_at` removes the entry and
//! reports a miss. Nothing sweeps in the background, so the map holds at
//! most the distinct keys seen within one TTL plus keys never read again.
//! [`ResponseCache::purge_expired`] exists for hosts that want to bound that.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::models::Policy;

/// Endpoint a cache key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Time,
    Timezones,
    Convert,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Time => write!(f, "time"),
            Endpoint::Timezones => write!(f, "timezones"),
            Endpoint::Convert => write!(f, "convert"),
        }
    }
}

/// Cache key: the endpoint plus its parameters, exactly as received.
///
/// Keys are structured, so no choice of parameter text can make one
/// endpoint's key equal another's.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: Endpoint,
    params: Vec<String>,
    policy: Option<Policy>,
}

impl CacheKey {
    pub fn time(zone: &str) -> Self {
        Self {
            endpoint: Endpoint::Time,
            params: vec![zone.to_string()],
            policy: None,
        }
    }

    pub fn timezones() -> Self {
        Self {
            endpoint: Endpoint::Timezones,
            params: Vec::new(),
            policy: None,
        }
    }

    pub fn convert(from: &str, to: &str, time: &str, policy: Policy) -> Self {
        Self {
            endpoint: Endpoint::Convert,
            params: vec![from.to_string(), to.to_string(), time.to_string()],
            policy: Some(policy),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.endpoint)?;
        for param in &self.params {
            write!(f, ":{param}")?;
        }
        if let Some(policy) = &self.policy {
            write!(f, ":{policy}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Shared TTL cache. Cheap to share behind `Arc`; all methods take `&self`.
pub struct ResponseCache<V> {
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// The cached value for `key`, unless missing or expired.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.get(key) {
            Some(entry) if now < entry.expires_at => {
                tracing::trace!(%key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                tracing::trace!(%key, "cache entry expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    pub fn put(&self, key: CacheKey, value: V, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
