//! Error types for the credential subsystem.
//!
//! - [`AuthError`] is what [`CredentialManager`](crate::CredentialManager)
//!   operations return.
//! - [`RefreshError`] comes from a [`RefreshClient`](crate::RefreshClient).
//! - [`LoginError`] comes from an [`InteractiveLogin`](crate::InteractiveLogin).
//! - [`ConfigError`] is returned while loading [`AuthConfig`](crate::AuthConfig).

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error used by custom collaborator implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by the token endpoint client.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The request could not be sent or the response could not be read.
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint answered with a non-success status.
    ///
    /// A `400` with `invalid_grant` usually means the refresh token was
    /// revoked and a new interactive login is needed.
    #[error("token endpoint rejected the refresh with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the endpoint.
        body: String,
    },

    /// The response body was not a valid token response.
    #[error("malformed token response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Any other failure from a custom client.
    #[error(transparent)]
    Other(BoxError),
}

/// Error returned by the interactive login collaborator.
///
/// Login failures are fatal for the credential subsystem: without a first
/// token there is no API access, and nothing retries automatically.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The user closed or cancelled the login flow.
    #[error("login was cancelled")]
    Cancelled,

    /// The authorization server denied access.
    #[error("access denied: {0}")]
    Denied(String),

    /// Any other failure from a custom login implementation.
    #[error(transparent)]
    Other(BoxError),
}

/// Error type for credential manager operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential is held. Sign in first.
    #[error("not signed in")]
    Unauthenticated,

    /// The held credential has no refresh token to renew it with.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// A login or refresh response carried an empty access token.
    #[error("token response did not contain an access token")]
    EmptyAccessToken,

    /// The interactive login failed.
    #[error("interactive login failed: {0}")]
    Login(#[from] LoginError),

    /// The refresh call failed. The previous token is still held.
    #[error("token refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// The background refresh task ended without a result.
    #[error("token refresh task was aborted")]
    Aborted,
}

/// Error returned while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The JSON document is malformed or misses required fields.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The YAML document is malformed or misses required fields.
    #[error(transparent)]
    Yaml(#[from] serde_saphyr::Error),

    /// The file extension is neither JSON nor YAML.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),
}
