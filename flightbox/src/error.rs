use flightbox_core::CacheKey;
use thiserror::Error;

/// Error type for cache lookups.
///
/// Storing, removing and clearing never fail. Lookups fail when a value is
/// not there, and detached fetches fail when their task dies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The key is absent or its entry has expired.
    #[error("Key {0} not found in cache")]
    KeyNotFound(CacheKey),

    /// A detached fetch task was cancelled before producing a result,
    /// typically because the runtime is shutting down.
    #[error("Fetch for key {0} was aborted")]
    FetchAborted(CacheKey),
}
