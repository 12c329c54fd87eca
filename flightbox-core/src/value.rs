//! Cached value type with expiration metadata.
//!
//! [`CacheValue`] wraps cached data together with an optional absolute
//! expiration timestamp. An entry without a timestamp never expires and stays
//! until it is removed explicitly.
//!
//! ```
//! use flightbox_core::CacheValue;
//! use std::time::Duration;
//!
//! let value = CacheValue::with_ttl("hubs", Some(Duration::from_secs(300)));
//! assert!(!value.is_expired());
//! assert!(value.ttl().is_some());
//!
//! let forever = CacheValue::with_ttl("hubs", None);
//! assert_eq!(forever.expire(), None);
//! ```

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// A cached value with expiration metadata.
///
/// # Type Parameter
///
/// * `T` - The cached data type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValue<T> {
    data: T,
    expire: Option<DateTime<Utc>>,
}

impl<T> CacheValue<T> {
    /// Creates a new cache value expiring at the given instant.
    ///
    /// `None` means the value never expires.
    pub fn new(data: T, expire: Option<DateTime<Utc>>) -> Self {
        CacheValue { data, expire }
    }

    /// Creates a new cache value that expires `ttl` from now.
    ///
    /// A `ttl` too large to be represented as a timestamp is treated as
    /// "never expires".
    pub fn with_ttl(data: T, ttl: Option<Duration>) -> Self {
        let expire = ttl.and_then(|ttl| {
            TimeDelta::from_std(ttl)
                .ok()
                .and_then(|delta| Utc::now().checked_add_signed(delta))
        });
        CacheValue { data, expire }
    }

    /// Returns a reference to the cached data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns when the data expires.
    #[inline]
    pub fn expire(&self) -> Option<DateTime<Utc>> {
        self.expire
    }

    /// Consumes the cache value and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Returns `true` if the value has expired at `now`.
    ///
    /// An entry is expired once `now` reaches its expiration timestamp.
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire.is_some_and(|expire| expire <= now)
    }

    /// Returns `true` if the value has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Calculate the remaining time-to-live.
    ///
    /// Returns `None` if the value never expires or has already expired.
    pub fn ttl(&self) -> Option<Duration> {
        self.expire
            .and_then(|expire| expire.signed_duration_since(Utc::now()).to_std().ok())
            .filter(|ttl| !ttl.is_zero())
    }
}
