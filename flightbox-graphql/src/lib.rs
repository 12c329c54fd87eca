#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// The GraphQL client and its builder.
pub mod client;

/// Error types for GraphQL requests.
pub mod error;

pub mod keys;

/// Request and response envelopes.
pub mod query;

pub use client::{GraphQlClient, GraphQlClientBuilder};
pub use error::GraphQlError;
pub use query::{GraphQlErrorDetail, GraphQlQuery, GraphQlResponse};
