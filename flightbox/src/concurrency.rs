use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Lock slot for a single key.
#[derive(Debug, Default)]
struct Slot {
    /// Callers currently holding or waiting for `mutex`.
    holders: usize,
    mutex: Arc<Mutex<()>>,
}

/// A map of async mutexes, one per key.
///
/// Locking a key creates its mutex on demand. Every caller that holds or waits
/// for the mutex is counted, and the slot is removed from the map as soon as
/// that count drops back to zero. Counting and removal both happen under the
/// map's shard lock, so a slot can never be reaped while someone is about to
/// wait on it, and the map does not grow with the number of distinct keys ever
/// seen.
///
/// Waiters are served in FIFO order. Locks for different keys are fully
/// independent.
///
/// # Example
///
/// ```
/// use flightbox::KeyedLocks;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let locks = KeyedLocks::new();
/// {
///     let _guard = locks.lock("token-refresh").await;
///     assert_eq!(locks.len(), 1);
/// }
/// assert!(locks.is_empty());
/// # }
/// ```
pub struct KeyedLocks<K>
where
    K: Eq + Hash,
{
    slots: DashMap<K, Slot>,
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }
}

impl<K> fmt::Debug for KeyedLocks<K>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLocks")
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, waiting for the current holder if any.
    ///
    /// The lock is released when the returned guard is dropped. Dropping this
    /// future before it completes gives up the place in the queue without
    /// leaking the slot.
    pub async fn lock(&self, key: K) -> KeyGuard<'_, K> {
        let mutex = {
            let mut slot = self.slots.entry(key.clone()).or_default();
            slot.holders += 1;
            Arc::clone(&slot.mutex)
        };
        // The guard is armed before waiting so that a cancelled wait still
        // gives back its place in the holder count.
        let mut guard = KeyGuard {
            locks: self,
            key,
            permit: None,
        };
        guard.permit = Some(mutex.lock_owned().await);
        guard
    }

    /// Acquires the lock for `key` through a shared handle.
    ///
    /// Same as [`lock`](Self::lock), but the guard owns a reference to the
    /// lock map and can be moved into a spawned task.
    pub async fn lock_owned(self: Arc<Self>, key: K) -> OwnedKeyGuard<K> {
        let mutex = {
            let mut slot = self.slots.entry(key.clone()).or_default();
            slot.holders += 1;
            Arc::clone(&slot.mutex)
        };
        let mut guard = OwnedKeyGuard {
            locks: self,
            key,
            permit: None,
        };
        guard.permit = Some(mutex.lock_owned().await);
        guard
    }

    /// Returns the number of keys that are currently locked or waited on.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no key is locked or waited on.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns how many callers hold or wait for the lock on `key`.
    pub fn holders(&self, key: &K) -> usize {
        self.slots.get(key).map_or(0, |slot| slot.holders)
    }

    fn release(&self, key: &K) {
        let reaped = self
            .slots
            .remove_if_mut(key, |_, slot| {
                slot.holders = slot.holders.saturating_sub(1);
                slot.holders == 0
            })
            .is_some();
        if reaped {
            trace!("Per-key lock reaped");
        }
    }
}

/// RAII guard for a key locked through [`KeyedLocks::lock`].
pub struct KeyGuard<'a, K>
where
    K: Eq + Hash + Clone,
{
    locks: &'a KeyedLocks<K>,
    key: K,
    permit: Option<OwnedMutexGuard<()>>,
}

impl<K> KeyGuard<'_, K>
where
    K: Eq + Hash + Clone,
{
    /// Returns the locked key.
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K> fmt::Debug for KeyGuard<'_, K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGuard")
            .field("key", &self.key)
            .field("locked", &self.permit.is_some())
            .finish()
    }
}

impl<K> Drop for KeyGuard<'_, K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        // Hand the mutex to the next waiter before leaving the holder count.
        drop(self.permit.take());
        self.locks.release(&self.key);
    }
}

/// RAII guard for a key locked through [`KeyedLocks::lock_owned`].
pub struct OwnedKeyGuard<K>
where
    K: Eq + Hash + Clone,
{
    locks: Arc<KeyedLocks<K>>,
    key: K,
    permit: Option<OwnedMutexGuard<()>>,
}

impl<K> OwnedKeyGuard<K>
where
    K: Eq + Hash + Clone,
{
    /// Returns the locked key.
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K> fmt::Debug for OwnedKeyGuard<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedKeyGuard")
            .field("key", &self.key)
            .field("locked", &self.permit.is_some())
            .finish()
    }
}

impl<K> Drop for OwnedKeyGuard<K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        drop(self.permit.take());
        self.locks.release(&self.key);
    }
}
