//! CredentialManager implementation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use flightbox::KeyedLocks;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::client::RefreshClient;
use crate::config::AuthConfig;
use crate::credential::{Credential, CredentialState, RefreshTrigger, TokenGrant};
use crate::error::AuthError;
use crate::login::InteractiveLogin;
use crate::metrics::{RefreshOutcome, record_refresh};
use crate::scheduler;

/// Lock key shared by every refresh, whatever started it.
pub const REFRESH_KEY: &str = "token-refresh";

/// Remaining lifetime below which [`CredentialManager::is_token_valid`]
/// reports the token as unusable.
pub const VALIDITY_MARGIN: Duration = Duration::from_secs(60);

/// Internal state shared across clones.
pub(crate) struct Inner {
    config: AuthConfig,
    client: Arc<dyn RefreshClient>,
    credential: watch::Sender<Option<Credential>>,
    locks: KeyedLocks<&'static str>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    generation: AtomicU64,
}

impl Inner {
    fn snapshot(&self) -> Option<Credential> {
        self.credential.borrow().clone()
    }

    fn held_token(&self) -> Option<String> {
        self.credential
            .borrow()
            .as_ref()
            .map(|credential| credential.access_token().to_owned())
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Renews the credential unless another refresh already did.
    ///
    /// `seen` is the generation the caller based its decision on. If the held
    /// credential has moved on by the time the refresh lock is acquired, the
    /// fresh token is returned without calling the token endpoint.
    pub(crate) async fn refresh(
        &self,
        trigger: RefreshTrigger,
        seen: u64,
    ) -> Result<String, AuthError> {
        let _guard = self.locks.lock(REFRESH_KEY).await;

        let current = self.snapshot().ok_or(AuthError::Unauthenticated)?;
        let renewed = current.generation() != seen;
        if renewed
            || (trigger != RefreshTrigger::Forced
                && !current.needs_refresh(Instant::now(), self.config.refresh_margin))
        {
            debug!(
                trigger = trigger.as_str(),
                generation = current.generation(),
                "Credential already renewed, skipping refresh"
            );
            record_refresh(trigger, RefreshOutcome::Coalesced);
            return Ok(current.access_token().to_owned());
        }

        if current.refresh_token().is_empty() {
            record_refresh(trigger, RefreshOutcome::Failed);
            return Err(AuthError::MissingRefreshToken);
        }

        debug!(trigger = trigger.as_str(), "Refreshing access token");
        let grant = match self
            .client
            .refresh(&self.config.client_credentials(), current.refresh_token())
            .await
        {
            Ok(grant) => grant,
            Err(err) => {
                record_refresh(trigger, RefreshOutcome::Failed);
                return Err(err.into());
            }
        };
        if grant.access_token.is_empty() {
            record_refresh(trigger, RefreshOutcome::Failed);
            return Err(AuthError::EmptyAccessToken);
        }

        let generation = self.next_generation();
        let now = Instant::now();
        let mut refreshed = None;
        // A shutdown or a new login during the call wins over this result.
        self.credential.send_if_modified(|slot| match slot {
            Some(held) if held.generation() == current.generation() => {
                held.renew(grant, now, generation);
                refreshed = Some((held.access_token().to_owned(), held.expires_in(now)));
                true
            }
            _ => false,
        });

        match refreshed {
            Some((token, expires_in)) => {
                record_refresh(trigger, RefreshOutcome::Refreshed);
                info!(
                    trigger = trigger.as_str(),
                    generation,
                    expires_in_secs = expires_in.as_secs(),
                    "Access token refreshed"
                );
                Ok(token)
            }
            None => {
                debug!("Credential replaced during refresh, discarding response");
                self.held_token().ok_or(AuthError::Unauthenticated)
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let scheduler = self
            .scheduler
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = scheduler.take() {
            handle.abort();
        }
    }
}

/// Holds a bearer credential and keeps it fresh.
///
/// After [`sign_in`](Self::sign_in) or [`install`](Self::install) a background
/// task renews the token `refresh_margin` before it expires. Callers asking
/// for the token inside that margin trigger a refresh themselves and wait for
/// it, bounded by `refresh_timeout`. Every refresh, proactive, reactive or
/// forced, goes through one per-manager lock, so concurrent callers share a
/// single call to the token endpoint.
///
/// Cloning is cheap and every clone shares the same credential. The
/// background task stops on [`shutdown`](Self::shutdown) or when the last
/// clone is dropped.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use flightbox_auth::{AuthConfig, CredentialManager, HttpRefreshClient, StaticLogin, TokenGrant};
///
/// # async fn run(grant: TokenGrant) -> Result<(), flightbox_auth::AuthError> {
/// let config = AuthConfig::new("client-id", "client-secret");
/// let client = Arc::new(HttpRefreshClient::from_config(&config));
/// let manager = CredentialManager::new(config, client);
///
/// manager.sign_in(&StaticLogin::new(grant)).await?;
/// let token = manager.current_token().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CredentialManager {
    inner: Arc<Inner>,
}

impl CredentialManager {
    /// Creates an unauthenticated manager.
    pub fn new(config: AuthConfig, client: Arc<dyn RefreshClient>) -> Self {
        let (credential, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                config,
                client,
                credential,
                locks: KeyedLocks::new(),
                scheduler: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.inner.config
    }

    /// Runs the interactive login once and adopts its token set.
    ///
    /// A failed login is fatal and is not retried. The manager stays
    /// unauthenticated.
    pub async fn sign_in(&self, login: &dyn InteractiveLogin) -> Result<(), AuthError> {
        let grant = login.login().await.map_err(|err| {
            error!(error = %err, "Interactive login failed");
            AuthError::Login(err)
        })?;
        self.install(grant)
    }

    /// Adopts a token set and starts proactive refreshing.
    ///
    /// Replaces any credential currently held.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn install(&self, grant: TokenGrant) -> Result<(), AuthError> {
        if grant.access_token.is_empty() {
            return Err(AuthError::EmptyAccessToken);
        }
        let generation = self.inner.next_generation();
        let credential = Credential::from_grant(grant, Instant::now(), generation);
        info!(
            generation,
            expires_in_secs = credential.expires_in(Instant::now()).as_secs(),
            "Credential installed"
        );
        self.inner.credential.send_replace(Some(credential));
        self.ensure_scheduler();
        Ok(())
    }

    /// Returns the access token to present on the next request.
    ///
    /// Returns immediately while the token is outside the refresh margin.
    /// Otherwise refreshes it, or joins a refresh already under way, and
    /// waits at most `refresh_timeout`. If the refresh fails or takes longer,
    /// the held token is returned even though it may be stale; a timed out
    /// refresh keeps running and its result is adopted when it arrives.
    ///
    /// Returns `None` only when no credential is held.
    pub async fn current_token(&self) -> Option<String> {
        let credential = self.inner.snapshot()?;
        if !credential.needs_refresh(Instant::now(), self.inner.config.refresh_margin) {
            return Some(credential.access_token().to_owned());
        }

        let refresh = self.spawn_refresh(RefreshTrigger::Reactive, credential.generation());
        match tokio::time::timeout(self.inner.config.refresh_timeout, refresh).await {
            Ok(Ok(Ok(token))) => Some(token),
            Ok(Ok(Err(err))) => {
                warn!(error = %err, "Token refresh failed, using held token");
                self.inner.held_token()
            }
            Ok(Err(err)) => {
                warn!(error = %err, "Token refresh task failed, using held token");
                self.inner.held_token()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.inner.config.refresh_timeout.as_millis(),
                    "Token refresh timed out, using held token"
                );
                self.inner.held_token()
            }
        }
    }

    /// Refreshes the token regardless of its remaining lifetime.
    ///
    /// Meant for callers whose request was rejected as unauthorized.
    /// Concurrent calls share one refresh. On failure the previous token is
    /// kept and the error is returned.
    pub async fn force_refresh(&self) -> Result<String, AuthError> {
        let seen = self
            .inner
            .snapshot()
            .ok_or(AuthError::Unauthenticated)?
            .generation();
        self.spawn_refresh(RefreshTrigger::Forced, seen)
            .await
            .map_err(|_| AuthError::Aborted)?
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> CredentialState {
        match self.inner.credential.borrow().as_ref() {
            None => CredentialState::Unauthenticated,
            Some(credential)
                if credential.needs_refresh(Instant::now(), self.inner.config.refresh_margin) =>
            {
                CredentialState::RefreshPending
            }
            Some(_) => CredentialState::Valid,
        }
    }

    /// Returns `true` if a non-empty token with more than a minute left is
    /// held.
    pub fn is_token_valid(&self) -> bool {
        self.inner.credential.borrow().as_ref().is_some_and(|credential| {
            !credential.access_token().is_empty()
                && credential.expires_in(Instant::now()) > VALIDITY_MARGIN
        })
    }

    /// Returns the time left until the held token expires.
    pub fn expires_in(&self) -> Option<Duration> {
        self.inner
            .credential
            .borrow()
            .as_ref()
            .map(|credential| credential.expires_in(Instant::now()))
    }

    /// Returns a copy of the held credential.
    pub fn credential(&self) -> Option<Credential> {
        self.inner.snapshot()
    }

    /// Stops proactive refreshing and forgets the credential.
    ///
    /// Calling it again has no effect. Tokens are not revoked on the server.
    pub fn shutdown(&self) {
        if let Some(handle) = self.inner.lock_scheduler().take() {
            handle.abort();
        }
        if self.inner.credential.send_replace(None).is_some() {
            info!("Credential manager shut down");
        }
    }

    fn spawn_refresh(
        &self,
        trigger: RefreshTrigger,
        seen: u64,
    ) -> JoinHandle<Result<String, AuthError>> {
        let inner = Arc::clone(&self.inner);
        let span = info_span!("token_refresh", trigger = trigger.as_str());
        tokio::spawn(async move { inner.refresh(trigger, seen).await }.instrument(span))
    }

    fn ensure_scheduler(&self) {
        let mut scheduler = self.inner.lock_scheduler();
        if scheduler.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let task = scheduler::run(
            Arc::downgrade(&self.inner),
            self.inner.credential.subscribe(),
            self.inner.config.refresh_margin,
            self.inner.config.min_refresh_interval,
        );
        *scheduler = Some(tokio::spawn(task.instrument(info_span!("token_scheduler"))));
        debug!("Proactive refresh scheduler started");
    }
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .finish()
    }
}
