use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use flightbox_core::CacheKey;
use tracing::{Instrument, debug, debug_span};

use crate::concurrency::KeyedLocks;
use crate::error::CacheError;
use crate::metrics::{LookupOutcome, record_lookup};
use crate::policy::CachePolicy;
use crate::storage::ExpiringCache;

/// Expiring cache with duplicate suppression for fetches.
///
/// [`get_or_fetch`](Self::get_or_fetch) looks a key up and, on a miss, runs
/// the supplied fetch and stores its result. Concurrent callers asking for the
/// same key queue on a per-key lock: the first one fetches, the others find
/// the stored value once they get the lock and return it without fetching.
///
/// Failures are never cached. A failed fetch is reported to the caller that
/// ran it, and the next caller in the queue runs its own fetch.
///
/// Keys must be a pure function of the logical request, e.g.
/// `elementGroups_{projectId}_{modelUrn}`.
///
/// # Example
///
/// ```
/// use flightbox::{CacheKey, SingleFlightCache};
/// use std::convert::Infallible;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache: SingleFlightCache<Vec<String>> = SingleFlightCache::new();
/// let key = CacheKey::new("hubs_list", std::iter::empty::<&str>());
///
/// let hubs = cache
///     .get_or_fetch(&key, None, || async {
///         Ok::<_, Infallible>(vec!["Design Hub".to_string()])
///     })
///     .await
///     .unwrap();
/// assert_eq!(hubs, vec!["Design Hub".to_string()]);
/// # }
/// ```
#[derive(Debug)]
pub struct SingleFlightCache<V> {
    storage: Arc<ExpiringCache<V>>,
    locks: Arc<KeyedLocks<CacheKey>>,
    policy: CachePolicy,
}

impl<V> Default for SingleFlightCache<V> {
    fn default() -> Self {
        Self::with_policy(CachePolicy::default())
    }
}

impl<V> SingleFlightCache<V> {
    /// Creates a cache with the default policy (five minute TTL).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache with the given policy.
    pub fn with_policy(policy: CachePolicy) -> Self {
        Self {
            storage: Arc::new(ExpiringCache::new()),
            locks: Arc::new(KeyedLocks::new()),
            policy,
        }
    }

    /// Returns the cache policy.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &ExpiringCache<V> {
        &self.storage
    }

    /// Drops the cached value for `key` so that the next lookup fetches.
    ///
    /// A fetch already in flight for the key is not affected and will store
    /// its result when it completes.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.storage.remove(key)
    }

    /// Drops every cached value.
    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Returns the number of keys with a fetch in flight or callers queued.
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

impl<V> SingleFlightCache<V>
where
    V: Clone,
{
    /// Returns the cached value for `key`, or fetches and caches it.
    ///
    /// `ttl` overrides the policy's default TTL for the stored value.
    ///
    /// For a given key, fetches never overlap: callers wait for the per-key
    /// lock, then check the cache again before deciding to fetch. Callers
    /// for other keys are never blocked.
    ///
    /// The fetch runs inside the caller's future. If that future is dropped
    /// mid-fetch, the fetch is cancelled and the next queued caller starts
    /// over. Use [`get_or_fetch_detached`](Self::get_or_fetch_detached) when
    /// callers may give up early.
    ///
    /// # Errors
    ///
    /// Returns the fetch's own error. Nothing is stored in that case.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.storage.try_get(key) {
            debug!(%key, "Cache hit");
            record_lookup(LookupOutcome::Hit);
            return Ok(value);
        }

        let _guard = self.locks.lock(key.clone()).await;

        // Another holder may have populated the key while we were queued.
        if let Some(value) = self.storage.try_get(key) {
            debug!(%key, "Cache hit after waiting for in-flight fetch");
            record_lookup(LookupOutcome::Coalesced);
            return Ok(value);
        }

        debug!(%key, "Cache miss, fetching");
        match fetch().await {
            Ok(value) => {
                let ttl = self.policy.resolve_ttl(ttl);
                self.storage.store(key.clone(), value.clone(), ttl);
                record_lookup(LookupOutcome::Miss);
                Ok(value)
            }
            Err(error) => {
                debug!(%key, "Fetch failed, nothing cached");
                record_lookup(LookupOutcome::FetchError);
                Err(error)
            }
        }
    }
}

impl<V> SingleFlightCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Like [`get_or_fetch`](Self::get_or_fetch), but the fetch runs in its
    /// own task.
    ///
    /// A caller that stops waiting, through a timeout or because its task is
    /// aborted, does not cancel the fetch. The task keeps the per-key lock
    /// until the result is stored, so queued callers get that result instead
    /// of fetching again.
    ///
    /// # Errors
    ///
    /// Returns the fetch's own error, or [`CacheError::FetchAborted`] if the
    /// fetch task was cancelled. A panic in the fetch is resumed in the
    /// caller.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub async fn get_or_fetch_detached<F, Fut, E>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: From<CacheError> + Send + 'static,
    {
        if let Some(value) = self.storage.try_get(key) {
            debug!(%key, "Cache hit");
            record_lookup(LookupOutcome::Hit);
            return Ok(value);
        }

        let guard = Arc::clone(&self.locks).lock_owned(key.clone()).await;

        if let Some(value) = self.storage.try_get(key) {
            debug!(%key, "Cache hit after waiting for in-flight fetch");
            record_lookup(LookupOutcome::Coalesced);
            return Ok(value);
        }

        debug!(%key, "Cache miss, fetching in background task");
        let storage = Arc::clone(&self.storage);
        let ttl = self.policy.resolve_ttl(ttl);
        let task_key = key.clone();
        let span = debug_span!("detached_fetch", key = %key);
        let task = tokio::spawn(
            async move {
                let _guard = guard;
                match fetch().await {
                    Ok(value) => {
                        storage.store(task_key, value.clone(), ttl);
                        record_lookup(LookupOutcome::Miss);
                        Ok(value)
                    }
                    Err(error) => {
                        debug!("Fetch failed, nothing cached");
                        record_lookup(LookupOutcome::FetchError);
                        Err(error)
                    }
                }
            }
            .instrument(span),
        );

        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(CacheError::FetchAborted(key.clone()).into()),
        }
    }
}
