use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Default entry lifetime (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expiry: Instant,
}

/// In-memory key/value cache with per-entry time-to-live.
///
/// Expiry is lazy: an entry is dropped when read after its deadline, or by an
/// explicit [`cleanup`](Self::cleanup). Time comes from `tokio::time`, so a
/// paused test runtime controls it.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` under `key` for the default TTL.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Store `value` under `key`, fresh until `now + ttl`.
    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        let expiry = Instant::now() + ttl;
        self.entries.insert(key.into(), CacheEntry { value, expiry });
    }

    /// Fresh value for `key`. An expired entry is removed and `None` returned.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = Instant::now() > self.entries.get(key)?.expiry;
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Whether an entry (fresh or stale) is stored for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn cleanup(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| now <= e.expiry);
        before - self.entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
