use flightbox::CacheError;
use flightbox_auth::AuthError;
use thiserror::Error;

use crate::query::GraphQlErrorDetail;

/// Error type for GraphQL requests.
///
/// None of these outcomes is cached: the next call for the same key fetches
/// again.
#[derive(Debug, Error)]
pub enum GraphQlError {
    /// No credential is held, or renewing a token rejected by the API
    /// failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The request task was cancelled before it produced a response.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API responded with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded as UTF-8.
        body: String,
    },

    /// The response carried a GraphQL `errors` array.
    #[error("query failed: {}", messages(.0))]
    Graph(Vec<GraphQlErrorDetail>),

    /// The response had neither errors nor data.
    #[error("response contained no data")]
    EmptyData,

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn messages(errors: &[GraphQlErrorDetail]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
