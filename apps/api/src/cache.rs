//! In-process TTL cache for memoizing expensive AI responses.
//!
//! Values are `serde_json::Value` so any serializable result can be stored.
//! Expiration is lazy: an expired entry is removed on the `get` that
//! observes it. There is no eviction beyond TTL — this is small
//! per-process memoization, not a shared cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

struct CacheEntry {
    value: Value,
    /// `None` means the entry never expires.
    expires_at: Option<Instant>,
}

/// Process-wide key→value store with per-entry expiration.
///
/// Keys are plain strings, namespaced by convention
/// (`insights:<industry>`, `jobmatch:<user>:<hash>`). Collision
/// avoidance is the caller's responsibility.
pub struct TtlCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the stored value, unless the entry has expired — in which
    /// case it is removed and `None` is returned.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    /// Stores `value` under `key`. With `Some(ttl)` the entry expires
    /// `ttl` from now; with `None` it never expires.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        self.set_at(key, value, ttl, Instant::now());
    }

    /// Unconditional removal.
    #[allow(dead_code)] // current callers rely on TTL expiry only
    pub fn delete(&self, key: &str) {
        self.lock().remove(key);
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) => entry.expires_at.is_some_and(|at| now > at),
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|e| e.value.clone())
    }

    fn set_at(&self, key: &str, value: Value, ttl: Option<Duration>, now: Instant) {
        let entry = CacheEntry {
            value,
            expires_at: ttl.map(|t| now + t),
        };
        self.lock().insert(key.to_string(), entry);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().expect("cache mutex poisoned")
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}
