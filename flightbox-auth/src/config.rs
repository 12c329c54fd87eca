//! Credential manager configuration.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://developer.api.autodesk.com/authentication/v2/token";

/// Default safety margin before expiry at which a token is refreshed.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Default time a caller waits for a reactive refresh.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default minimum spacing between two proactive refresh attempts.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Name of the settings section holding the credentials in an application
/// settings document.
const SETTINGS_SECTION: &str = "APS";

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_owned()
}

fn default_refresh_margin() -> Duration {
    DEFAULT_REFRESH_MARGIN
}

fn default_refresh_timeout() -> Duration {
    DEFAULT_REFRESH_TIMEOUT
}

fn default_min_refresh_interval() -> Duration {
    DEFAULT_MIN_REFRESH_INTERVAL
}

/// Configuration of a [`CredentialManager`](crate::CredentialManager).
///
/// Durations use human readable strings (`"5m"`, `"30s"`).
///
/// ```yaml
/// client_id: my-app
/// client_secret: s3cr3t
/// refresh_margin: 5m
/// refresh_timeout: 30s
/// ```
///
/// The JSON loader also accepts an application settings document with the
/// credentials under an `APS` section:
///
/// ```json
/// { "APS": { "ClientId": "my-app", "ClientSecret": "s3cr3t" } }
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth2 client identifier.
    #[serde(alias = "ClientId")]
    pub client_id: String,

    /// OAuth2 client secret.
    #[serde(alias = "ClientSecret")]
    pub client_secret: String,

    /// Token endpoint used for refreshes.
    #[serde(default = "default_token_url", alias = "TokenUrl")]
    pub token_url: String,

    /// How long before expiry a token counts as due for refresh.
    #[serde(default = "default_refresh_margin", with = "humantime_serde")]
    pub refresh_margin: Duration,

    /// How long `current_token` waits for a reactive refresh before
    /// returning the held token.
    #[serde(default = "default_refresh_timeout", with = "humantime_serde")]
    pub refresh_timeout: Duration,

    /// Minimum spacing between two proactive refresh attempts.
    #[serde(default = "default_min_refresh_interval", with = "humantime_serde")]
    pub min_refresh_interval: Duration,
}

impl AuthConfig {
    /// Creates a configuration with default endpoint and timings.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: default_token_url(),
            refresh_margin: DEFAULT_REFRESH_MARGIN,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }

    /// Sets the token endpoint.
    pub fn token_url(self, token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            ..self
        }
    }

    /// Sets the refresh margin.
    pub fn refresh_margin(self, refresh_margin: Duration) -> Self {
        Self {
            refresh_margin,
            ..self
        }
    }

    /// Sets the reactive refresh timeout.
    pub fn refresh_timeout(self, refresh_timeout: Duration) -> Self {
        Self {
            refresh_timeout,
            ..self
        }
    }

    /// Sets the minimum spacing between proactive refresh attempts.
    pub fn min_refresh_interval(self, min_refresh_interval: Duration) -> Self {
        Self {
            min_refresh_interval,
            ..self
        }
    }

    /// Returns the client credentials presented to the token endpoint.
    pub fn client_credentials(&self) -> ClientCredentials {
        ClientCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_saphyr::from_str(yaml)?)
    }

    /// Parses a JSON document.
    ///
    /// Accepts either the configuration object itself or a settings document
    /// holding it under an `APS` key.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut document: serde_json::Value = serde_json::from_str(json)?;
        let section = document
            .as_object_mut()
            .and_then(|object| object.remove(SETTINGS_SECTION))
            .unwrap_or(document);
        Ok(serde_json::from_value(section)?)
    }

    /// Reads a configuration file, choosing the format by extension
    /// (`.json`, `.yaml` or `.yml`).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        match extension.as_deref() {
            Some("json") => Self::from_json_str(&read()?),
            Some("yaml" | "yml") => Self::from_yaml_str(&read()?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .field("refresh_margin", &self.refresh_margin)
            .field("refresh_timeout", &self.refresh_timeout)
            .field("min_refresh_interval", &self.min_refresh_interval)
            .finish()
    }
}

/// Static client identity presented on every refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// OAuth2 client identifier.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
