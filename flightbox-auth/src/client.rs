//! Token endpoint clients.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::config::{AuthConfig, ClientCredentials};
use crate::credential::TokenGrant;
use crate::error::RefreshError;

/// Exchanges a refresh token for a new token set.
///
/// [`HttpRefreshClient`] talks to a real OAuth2 endpoint. Tests and embedders
/// can provide their own implementation.
#[async_trait]
pub trait RefreshClient: Send + Sync {
    /// Performs a `refresh_token` grant.
    async fn refresh(
        &self,
        client: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenGrant, RefreshError>;
}

/// OAuth2 `refresh_token` grant over HTTP.
///
/// Sends a form-encoded `POST` with HTTP basic client authentication and
/// decodes the JSON token response.
#[derive(Debug, Clone)]
pub struct HttpRefreshClient {
    http: reqwest::Client,
    token_url: String,
}

impl HttpRefreshClient {
    /// Creates a client for `token_url` with a default [`reqwest::Client`].
    pub fn new(token_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), token_url)
    }

    /// Creates a client reusing an existing [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            http,
            token_url: token_url.into(),
        }
    }

    /// Creates a client for the endpoint named in `config`.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token_url.clone())
    }

    /// Returns the token endpoint URL.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl RefreshClient for HttpRefreshClient {
    async fn refresh(
        &self,
        client: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenGrant, RefreshError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&client.client_id, Some(&client.client_secret))
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "Token endpoint rejected refresh");
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
