#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Token endpoint clients.
///
/// Defines the [`RefreshClient`](client::RefreshClient) trait and its HTTP
/// implementation.
pub mod client;

/// Configuration loading.
pub mod config;

/// Credential and token grant types.
pub mod credential;

pub mod error;

/// Interactive login seam.
pub mod login;

/// The credential manager.
///
/// [`CredentialManager`](manager::CredentialManager) owns the credential,
/// serializes refreshes and runs the proactive refresh task.
pub mod manager;

/// Metrics collection for refresh observability.
///
/// When the `metrics` feature is enabled, this module registers counters for
/// successful, coalesced and failed refreshes.
pub mod metrics;

mod scheduler;

pub use client::{HttpRefreshClient, RefreshClient};
pub use config::{AuthConfig, ClientCredentials};
pub use credential::{Credential, CredentialState, RefreshTrigger, TokenGrant};
pub use error::{AuthError, BoxError, ConfigError, LoginError, RefreshError};
pub use login::{InteractiveLogin, StaticLogin};
pub use manager::CredentialManager;
