//! Cache key type and construction.
//!
//! A [`CacheKey`] is a plain string. Callers build it from a prefix naming the
//! kind of request and the parts identifying one logical request, joined with
//! `_`:
//!
//! ```
//! use flightbox_core::CacheKey;
//!
//! let key = CacheKey::new("elementGroups", ["project-1", "urn:adsk:model"]);
//! assert_eq!(key.as_str(), "elementGroups_project-1_urn:adsk:model");
//!
//! let key = CacheKey::new("hubs_list", std::iter::empty::<&str>());
//! assert_eq!(key.as_str(), "hubs_list");
//! ```
//!
//! Building keys is the caller's responsibility. The same logical request must
//! always produce the same key and two distinct requests must never collide,
//! otherwise unrelated fetches would be coalesced together.
//!
//! [`CacheKey`] wraps a [`SmolStr`], so short keys (up to 23 bytes) are stored
//! inline and longer ones are reference counted. Cloning is cheap either way.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Separator placed between the prefix and every key part.
pub const KEY_SEPARATOR: char = '_';

/// A cache key identifying a cached entry.
///
/// # Example
///
/// ```
/// use flightbox_core::CacheKey;
///
/// let key = CacheKey::new("hub", ["b.1234"]);
/// assert_eq!(format!("{}", key), "hub_b.1234");
/// assert_eq!(key, CacheKey::from("hub_b.1234"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(SmolStr);

impl CacheKey {
    /// Creates a key from a prefix and the parts identifying the request.
    ///
    /// Parts are appended in order, each preceded by [`KEY_SEPARATOR`].
    /// Empty parts are kept so that `("a", ["", "b"])` and `("a", ["b"])`
    /// stay distinct.
    pub fn new<I, P>(prefix: &str, parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut key = String::from(prefix);
        for part in parts {
            key.push(KEY_SEPARATOR);
            key.push_str(part.as_ref());
        }
        CacheKey(SmolStr::from(key))
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the number of bytes in the key.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the key is the empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey(SmolStr::new(key))
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        CacheKey(SmolStr::from(key))
    }
}

impl From<SmolStr> for CacheKey {
    fn from(key: SmolStr) -> Self {
        CacheKey(key)
    }
}
