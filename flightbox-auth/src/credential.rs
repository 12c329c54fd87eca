//! Bearer credential types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Longest token lifetime accepted from a server. Larger `expires_in`
/// values are clamped so that deadline arithmetic cannot overflow.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Token set returned by a login or a refresh.
///
/// Deserializes from a standard OAuth2 token response:
///
/// ```
/// use flightbox_auth::TokenGrant;
///
/// let grant: TokenGrant = serde_json::from_str(
///     r#"{"access_token": "at", "token_type": "Bearer", "expires_in": 3599}"#,
/// ).unwrap();
/// assert_eq!(grant.expires_in, 3599);
/// assert_eq!(grant.refresh_token, None);
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Access token presented on API requests.
    pub access_token: String,
    /// Refresh token. Absent or empty means "unchanged".
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: u64,
}

impl TokenGrant {
    /// Creates a grant.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Duration,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_in: expires_in.as_secs(),
        }
    }

    /// Returns the access token lifetime, clamped to [`MAX_TOKEN_LIFETIME`].
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.expires_in).min(MAX_TOKEN_LIFETIME)
    }
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// The bearer credential held by the manager.
///
/// Every field is replaced together on refresh, readers always see a
/// consistent triple. Each replacement gets a new generation number, which
/// lets a waiting refresher tell whether somebody else already renewed the
/// credential.
#[derive(Clone)]
pub struct Credential {
    access_token: String,
    refresh_token: String,
    expires_at: Instant,
    generation: u64,
}

impl Credential {
    /// Creates a credential from a login grant received at `now`.
    pub fn from_grant(grant: TokenGrant, now: Instant, generation: u64) -> Self {
        let expires_at = now + grant.lifetime();
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.unwrap_or_default(),
            expires_at,
            generation,
        }
    }

    /// Applies a refresh response received at `now`.
    ///
    /// The refresh token is only replaced when the response carries a
    /// non-empty one.
    pub fn renew(&mut self, grant: TokenGrant, now: Instant, generation: u64) {
        self.expires_at = now + grant.lifetime();
        self.access_token = grant.access_token;
        if let Some(refresh_token) = grant.refresh_token.filter(|token| !token.is_empty()) {
            self.refresh_token = refresh_token;
        }
        self.generation = generation;
    }

    /// Returns the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token. Empty if none was ever issued.
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Returns when the access token expires.
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns the generation of this credential.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the time left until expiry, zero once expired.
    pub fn expires_in(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// Returns `true` once `now` is within `margin` of the expiry.
    ///
    /// A margin too large to represent covers any expiry.
    pub fn needs_refresh(&self, now: Instant, margin: Duration) -> bool {
        now.checked_add(margin)
            .is_none_or(|threshold| threshold >= self.expires_at)
    }

    /// Returns the instant at which a proactive refresh is due.
    pub fn refresh_at(&self, margin: Duration) -> Instant {
        self.expires_at
            .checked_sub(margin)
            .unwrap_or_else(Instant::now)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Lifecycle state of the credential manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// No credential is held.
    Unauthenticated,
    /// A credential is held and is outside the refresh margin.
    Valid,
    /// A credential is held but is within the refresh margin or expired.
    /// The next access refreshes it unless the scheduler gets there first.
    RefreshPending,
}

/// What started a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// The background scheduler, ahead of expiry.
    Proactive,
    /// A caller that found the token inside the refresh margin.
    Reactive,
    /// An explicit request, typically after the API rejected the token.
    Forced,
}

impl RefreshTrigger {
    /// Returns the trigger name used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proactive => "proactive",
            Self::Reactive => "reactive",
            Self::Forced => "forced",
        }
    }
}
