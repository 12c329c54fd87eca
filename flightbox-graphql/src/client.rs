use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use flightbox::{CacheKey, CachePolicy, SingleFlightCache};
use flightbox_auth::{AuthError, CredentialManager};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};

use crate::error::GraphQlError;
use crate::query::{GraphQlQuery, decode};

/// Default GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://developer.api.autodesk.com/aec/private/graphql";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// GraphQL client with cached, single-flight queries.
///
/// Every request carries the bearer token of the shared
/// [`CredentialManager`]. If the API answers `401 Unauthorized`, the token is
/// refreshed once and the request is retried.
///
/// Cached queries store the raw response body under a caller supplied key
/// and decode it on every call, so differently typed views of the same
/// response can share an entry. Only responses without GraphQL errors are
/// stored.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use flightbox_auth::{AuthConfig, CredentialManager, HttpRefreshClient};
/// use flightbox_graphql::{GraphQlClient, GraphQlQuery, keys};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Hubs {
///     hubs: serde_json::Value,
/// }
///
/// # async fn run() -> Result<(), flightbox_graphql::GraphQlError> {
/// let config = AuthConfig::new("client-id", "client-secret");
/// let credentials = CredentialManager::new(
///     config.clone(),
///     Arc::new(HttpRefreshClient::from_config(&config)),
/// );
/// let client = GraphQlClient::builder(credentials).build();
///
/// let hubs: Hubs = client
///     .cached_query(&keys::hubs(), None, false, &GraphQlQuery::new("{ hubs { results { id name } } }"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    credentials: CredentialManager,
    cache: Arc<SingleFlightCache<Bytes>>,
}

impl GraphQlClient {
    /// Creates a builder using `credentials` for authorization.
    pub fn builder(credentials: CredentialManager) -> GraphQlClientBuilder {
        GraphQlClientBuilder::new(credentials)
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the credential manager.
    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Returns the response cache.
    pub fn cache(&self) -> &SingleFlightCache<Bytes> {
        &self.cache
    }

    /// Runs a query without caching.
    pub async fn query<T>(&self, query: &GraphQlQuery) -> Result<T, GraphQlError>
    where
        T: DeserializeOwned,
    {
        let body = self.execute(query).await?;
        decode(&body)
    }

    /// Runs a query through the cache.
    ///
    /// Concurrent calls with the same `key` share one request. The request
    /// runs in its own task, so a caller that gives up early does not cancel
    /// it for the callers still waiting. `ttl` overrides the cache's default
    /// lifetime. With `force_refresh` the cached entry is dropped first, so
    /// the query always reaches the API.
    pub async fn cached_query<T>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        force_refresh: bool,
        query: &GraphQlQuery,
    ) -> Result<T, GraphQlError>
    where
        T: DeserializeOwned,
    {
        if force_refresh {
            debug!(%key, "Dropping cached response before refresh");
            self.cache.invalidate(key);
        }

        let client = self.clone();
        let query = query.clone();
        let body = self
            .cache
            .get_or_fetch_detached(key, ttl, move || async move {
                let body = client.execute(&query).await?;
                // Responses reporting errors must not be cached.
                decode::<IgnoredAny>(&body)?;
                Ok::<_, GraphQlError>(body)
            })
            .await?;
        decode(&body)
    }

    async fn execute(&self, query: &GraphQlQuery) -> Result<Bytes, GraphQlError> {
        let token = self
            .credentials
            .current_token()
            .await
            .ok_or(AuthError::Unauthenticated)?;

        let mut response = self.send(query, &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Token rejected by the API, refreshing and retrying once");
            let token = self.credentials.force_refresh().await?;
            response = self.send(query, &token).await?;
        }

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(GraphQlError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }

    async fn send(
        &self,
        query: &GraphQlQuery,
        token: &str,
    ) -> Result<reqwest::Response, GraphQlError> {
        Ok(self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .json(query)
            .send()
            .await?)
    }
}

/// Builder for [`GraphQlClient`].
#[derive(Debug)]
pub struct GraphQlClientBuilder {
    credentials: CredentialManager,
    endpoint: String,
    timeout: Duration,
    http: Option<reqwest::Client>,
    cache: Option<Arc<SingleFlightCache<Bytes>>>,
}

impl GraphQlClientBuilder {
    /// Creates a builder with the default endpoint, timeout and cache.
    pub fn new(credentials: CredentialManager) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            http: None,
            cache: None,
        }
    }

    /// Sets the endpoint URL.
    pub fn endpoint(self, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..self
        }
    }

    /// Sets the per-request timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Reuses an existing [`reqwest::Client`].
    pub fn http_client(self, http: reqwest::Client) -> Self {
        Self {
            http: Some(http),
            ..self
        }
    }

    /// Shares a response cache with other clients.
    pub fn cache(self, cache: Arc<SingleFlightCache<Bytes>>) -> Self {
        Self {
            cache: Some(cache),
            ..self
        }
    }

    /// Uses a private cache with the given policy.
    pub fn cache_policy(self, policy: CachePolicy) -> Self {
        self.cache(Arc::new(SingleFlightCache::with_policy(policy)))
    }

    /// Builds the client.
    pub fn build(self) -> GraphQlClient {
        GraphQlClient {
            http: self.http.unwrap_or_default(),
            endpoint: self.endpoint,
            timeout: self.timeout,
            credentials: self.credentials,
            cache: self.cache.unwrap_or_default(),
        }
    }
}
