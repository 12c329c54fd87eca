//! Metrics declaration and recording helpers.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

use crate::credential::RefreshTrigger;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of successful token refreshes.
    pub static ref REFRESH_SUCCESS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "flightbox_token_refresh_total",
            "Total number of successful token refreshes."
        );
        "flightbox_token_refresh_total"
    };
    /// Track number of failed token refreshes.
    pub static ref REFRESH_FAILURE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "flightbox_token_refresh_errors_total",
            "Total number of failed token refreshes."
        );
        "flightbox_token_refresh_errors_total"
    };
    /// Track number of refresh requests served by another caller's refresh.
    pub static ref REFRESH_COALESCED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "flightbox_token_refresh_coalesced_total",
            "Total number of refresh requests satisfied by a concurrent refresh."
        );
        "flightbox_token_refresh_coalesced_total"
    };
}

/// Outcome of a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The token endpoint issued a new token.
    Refreshed,
    /// Another refresh renewed the credential first.
    Coalesced,
    /// The refresh failed.
    Failed,
}

/// Record a refresh attempt.
///
/// When the `metrics` feature is disabled, this function is a no-op
/// and will be eliminated by the compiler.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_refresh(trigger: RefreshTrigger, outcome: RefreshOutcome) {
    let counter = match outcome {
        RefreshOutcome::Refreshed => *REFRESH_SUCCESS_COUNTER,
        RefreshOutcome::Coalesced => *REFRESH_COALESCED_COUNTER,
        RefreshOutcome::Failed => *REFRESH_FAILURE_COUNTER,
    };
    metrics::counter!(counter, "trigger" => trigger.as_str()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_refresh(_trigger: RefreshTrigger, _outcome: RefreshOutcome) {}
