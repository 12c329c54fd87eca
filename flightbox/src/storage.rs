//! Expiring in-memory storage.
//!
//! [`ExpiringCache`] is a concurrent key-value map where every entry carries
//! an optional absolute expiration time. Expiration is lazy: nothing sweeps the
//! map in the background, an expired entry is dropped the next time somebody
//! reads it.

use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use flightbox_core::{CacheKey, CacheValue};

use crate::CacheError;

/// Concurrent map of values with per-entry expiration.
///
/// All operations take `&self` and are safe to call from any number of tasks
/// at once. The map is sharded, so writers only contend with operations on
/// keys in the same shard, and no reader ever observes a half-written entry.
///
/// Values are returned by clone. Wrap large values in an `Arc` or use a
/// cheaply clonable type such as `Bytes`.
///
/// # Example
///
/// ```
/// use flightbox::{CacheKey, ExpiringCache};
/// use std::time::Duration;
///
/// let cache = ExpiringCache::new();
/// let key = CacheKey::from("hub_b.1234");
///
/// cache.store(key.clone(), "Design Hub".to_string(), Some(Duration::from_secs(300)));
/// assert_eq!(cache.try_get(&key).as_deref(), Some("Design Hub"));
///
/// cache.remove(&key);
/// assert!(cache.try_get(&key).is_none());
/// ```
#[derive(Debug)]
pub struct ExpiringCache<V> {
    entries: DashMap<CacheKey, CacheValue<V>>,
}

impl<V> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V> ExpiringCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry for `key`.
    ///
    /// With `ttl` set to `None` the entry never expires and stays until it is
    /// removed or the cache is cleared.
    pub fn store(&self, key: CacheKey, value: V, ttl: Option<Duration>) {
        self.entries.insert(key, CacheValue::with_ttl(value, ttl));
    }

    /// Removes the entry for `key`.
    ///
    /// Returns `true` if an entry was present, expired or not.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the number of stored entries, including expired entries that
    /// have not been read since they expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a live entry exists for `key`.
    ///
    /// Like [`try_get`](Self::try_get), an expired entry is purged.
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.live(key, |_| ()).is_some()
    }

    /// Runs `f` on the live entry for `key`, purging it if it has expired.
    fn live<R>(&self, key: &CacheKey, f: impl FnOnce(&V) -> R) -> Option<R> {
        let now = Utc::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired_at(now) {
                return Some(f(entry.data()));
            }
        }
        // Only drop the entry we saw expire; a concurrent store may have
        // replaced it in the meantime.
        self.entries
            .remove_if(key, |_, value| value.is_expired_at(now));
        None
    }
}

impl<V> ExpiringCache<V>
where
    V: Clone,
{
    /// Returns the value for `key` if present and not expired.
    ///
    /// An expired entry is removed as a side effect.
    pub fn try_get(&self, key: &CacheKey) -> Option<V> {
        self.live(key, V::clone)
    }

    /// Returns the value for `key`, or [`CacheError::KeyNotFound`] if it is
    /// absent or expired.
    pub fn get(&self, key: &CacheKey) -> Result<V, CacheError> {
        self.try_get(key)
            .ok_or_else(|| CacheError::KeyNotFound(key.clone()))
    }
}
