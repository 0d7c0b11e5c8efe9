//! Time-bounded cache for discovery results.
//!
//! Entries are immutable snapshots. Reads evict stale entries; writes blindly
//! overwrite. TTL is the only bound, there is no size-based eviction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::DEFAULT_CACHE_TTL;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock; follows tokio's paused clock inside `start_paused` tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Storage for catalog listings (kinds, namespaces, databases).
pub trait CatalogCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<String>>;
    fn set(&self, key: String, data: Vec<String>);
    /// `None` empties the cache; `Some(pattern)` drops every key containing it.
    fn clear(&self, pattern: Option<&str>);

    /// Drops every key starting with `prefix`. Falls back to a substring
    /// clear, which can only drop more than asked.
    fn clear_prefix(&self, prefix: &str) {
        self.clear(Some(prefix));
    }
}

#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: Instant,
}

pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T> std::fmt::Debug for TtlCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}

impl<T> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Number of stored entries, including stale ones not yet read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> TtlCache<T> {
    pub fn get_entry(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let fresh = entries
            .get(key)
            .map(|entry| now.saturating_duration_since(entry.timestamp) <= self.ttl)?;
        if fresh {
            entries.get(key).map(|entry| entry.data.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    pub fn set_entry(&self, key: String, data: T) {
        let timestamp = self.clock.now();
        self.lock().insert(key, CacheEntry { data, timestamp });
    }

    pub fn clear_matching(&self, pattern: Option<&str>) {
        let mut entries = self.lock();
        match pattern {
            None => entries.clear(),
            Some(pattern) => entries.retain(|key, _| !key.contains(pattern)),
        }
    }

    pub fn clear_prefixed(&self, prefix: &str) {
        self.lock().retain(|key, _| !key.starts_with(prefix));
    }
}

impl CatalogCache for TtlCache<Vec<String>> {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        self.get_entry(key)
    }

    fn set(&self, key: String, data: Vec<String>) {
        self.set_entry(key, data);
    }

    fn clear(&self, pattern: Option<&str>) {
        self.clear_matching(pattern);
    }

    fn clear_prefix(&self, prefix: &str) {
        self.clear_prefixed(prefix);
    }
}

pub(crate) fn kinds_key(
    project_id: &str,
    namespace_id: Option<&str>,
    database_id: Option<&str>,
) -> String {
    format!(
        "kinds:{project_id}:{}:{}",
        namespace_id.unwrap_or_default(),
        database_id.unwrap_or("*")
    )
}

pub(crate) fn databases_key(project_id: &str, namespace_id: Option<&str>) -> String {
    format!("databases:{project_id}:{}", namespace_id.unwrap_or_default())
}

pub(crate) fn namespaces_key(project_id: &str, database_id: Option<&str>) -> String {
    format!("namespaces:{project_id}:{}", database_id.unwrap_or("*"))
}

/// Key prefixes owned by `project_id`, one per listing type.
pub(crate) fn project_prefixes(project_id: &str) -> [String; 3] {
    [
        format!("kinds:{project_id}:"),
        format!("databases:{project_id}:"),
        format!("namespaces:{project_id}:"),
    ]
}
