//! Metrics declaration and recording helpers.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of cache hit events.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "flightbox_cache_hit_total",
            "Total number of cache hit events."
        );
        "flightbox_cache_hit_total"
    };
    /// Track number of cache miss events.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "flightbox_cache_miss_total",
            "Total number of cache miss events (fetch executed)."
        );
        "flightbox_cache_miss_total"
    };
    /// Track number of callers served by a fetch another caller ran.
    pub static ref CACHE_COALESCED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "flightbox_cache_coalesced_total",
            "Total number of callers served by an in-flight fetch of another caller."
        );
        "flightbox_cache_coalesced_total"
    };
    /// Track number of failed fetches.
    pub static ref FETCH_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "flightbox_fetch_errors_total",
            "Total number of failed fetches (never cached)."
        );
        "flightbox_fetch_errors_total"
    };
}

/// Outcome of a single-flight lookup, used as a metric selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Served from the cache without waiting.
    Hit,
    /// Served from the cache after waiting for another caller's fetch.
    Coalesced,
    /// Fetched and stored.
    Miss,
    /// Fetch failed.
    FetchError,
}

/// Record the outcome of a lookup.
///
/// When the `metrics` feature is disabled, this function is a no-op
/// and will be eliminated by the compiler.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_lookup(outcome: LookupOutcome) {
    let counter = match outcome {
        LookupOutcome::Hit => *CACHE_HIT_COUNTER,
        LookupOutcome::Coalesced => *CACHE_COALESCED_COUNTER,
        LookupOutcome::Miss => *CACHE_MISS_COUNTER,
        LookupOutcome::FetchError => *FETCH_ERROR_COUNTER,
    };
    metrics::counter!(counter).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_lookup(_outcome: LookupOutcome) {}
