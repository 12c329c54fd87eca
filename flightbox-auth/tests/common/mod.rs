//! Shared helpers for credential manager tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flightbox_auth::{
    AuthConfig, ClientCredentials, CredentialManager, RefreshClient, RefreshError, TokenGrant,
};

type Respond = dyn Fn(usize) -> Result<TokenGrant, RefreshError> + Send + Sync;

/// Refresh client answering from a closure called with the call index.
pub struct MockRefreshClient {
    respond: Box<Respond>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockRefreshClient {
    pub fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(usize) -> Result<TokenGrant, RefreshError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Answers every call with `token-{n}`, where `n` counts from one.
    pub fn issuing(expires_in: u64) -> Arc<Self> {
        Self::new(move |call| Ok(grant(&format!("token-{}", call + 1), None, expires_in)))
    }

    pub fn with_delay<F>(delay: Duration, respond: F) -> Arc<Self>
    where
        F: Fn(usize) -> Result<TokenGrant, RefreshError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens presented so far, in call order.
    pub fn seen_refresh_tokens(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl RefreshClient for MockRefreshClient {
    async fn refresh(
        &self,
        _client: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenGrant, RefreshError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(refresh_token.to_owned());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(call)
    }
}

pub fn grant(access_token: &str, refresh_token: Option<&str>, expires_in: u64) -> TokenGrant {
    TokenGrant {
        access_token: access_token.to_owned(),
        refresh_token: refresh_token.map(str::to_owned),
        expires_in,
    }
}

pub fn config() -> AuthConfig {
    AuthConfig::new("client-id", "client-secret")
}

pub fn manager(client: Arc<MockRefreshClient>) -> CredentialManager {
    CredentialManager::new(config(), client)
}
