use std::time::Duration;

use serde::{Deserialize, Serialize};

/// TTL used when neither the caller nor the configuration provides one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

fn default_ttl() -> Option<Duration> {
    Some(DEFAULT_TTL)
}

/// Cache policy configuration.
///
/// Durations are written in human-readable form ("5m", "30s", "500ms"):
///
/// ```
/// use flightbox::CachePolicy;
/// use std::time::Duration;
///
/// let policy: CachePolicy = serde_json::from_str(r#"{"default_ttl": "90s"}"#).unwrap();
/// assert_eq!(policy.default_ttl, Some(Duration::from_secs(90)));
///
/// let policy: CachePolicy = serde_json::from_str("{}").unwrap();
/// assert_eq!(policy, CachePolicy::default());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CachePolicy {
    /// TTL applied when a caller does not pass one. `None` keeps such entries
    /// until they are invalidated.
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub default_ttl: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
        }
    }
}

impl CachePolicy {
    /// Creates a policy with the given default TTL.
    pub fn with_default_ttl(ttl: Duration) -> Self {
        Self {
            default_ttl: Some(ttl),
        }
    }

    /// Creates a policy whose entries never expire unless a TTL is passed.
    pub fn never_expire() -> Self {
        Self { default_ttl: None }
    }

    /// Picks the TTL for a store: the explicit one if given, else the default.
    #[inline]
    pub fn resolve_ttl(&self, ttl: Option<Duration>) -> Option<Duration> {
        ttl.or(self.default_ttl)
    }
}
