#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Per-key mutual exclusion.
///
/// [`KeyedLocks`](concurrency::KeyedLocks) hands out one async mutex per key,
/// created on first use and dropped again once nobody holds or waits on it.
/// It is the primitive behind single-flight fetches and token refreshes.
pub mod concurrency;

/// Error types for cache operations.
pub mod error;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module registers counters for
/// cache hits, misses, coalesced waits and failed fetches.
pub mod metrics;

/// Cache policy configuration.
///
/// Defines [`CachePolicy`](policy::CachePolicy), which holds the TTL applied
/// when a caller does not pass one explicitly.
pub mod policy;

/// Single-flight cache.
///
/// [`SingleFlightCache`](single_flight::SingleFlightCache) wraps an
/// [`ExpiringCache`] and makes sure that concurrent requests for the same key
/// run the underlying fetch at most once.
pub mod single_flight;

/// Expiring in-memory storage.
pub mod storage;

pub use concurrency::{KeyGuard, KeyedLocks, OwnedKeyGuard};
pub use error::CacheError;
pub use flightbox_core::{CacheKey, CacheValue};
pub use policy::CachePolicy;
pub use single_flight::SingleFlightCache;
pub use storage::ExpiringCache;

/// The `flightbox` prelude.
///
/// ```rust
/// use flightbox::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{CacheError, CacheKey, CachePolicy, ExpiringCache, SingleFlightCache};
}
