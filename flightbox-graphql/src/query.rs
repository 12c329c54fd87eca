use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::GraphQlError;

/// A GraphQL request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlQuery {
    /// Query document.
    pub query: String,
    /// Variables referenced by the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

impl GraphQlQuery {
    /// Creates a query without variables.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
        }
    }

    /// Sets the variables.
    pub fn variables(self, variables: serde_json::Value) -> Self {
        Self {
            variables: Some(variables),
            ..self
        }
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlErrorDetail {
    /// Human readable description.
    pub message: String,
    /// Path of the field that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,
    /// Server specific details, such as an error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

/// A GraphQL response envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlResponse<T> {
    /// Result of the query. `None` when the server returned `null` or omitted
    /// it.
    pub data: Option<T>,
    /// Errors reported by the server.
    #[serde(default)]
    pub errors: Vec<GraphQlErrorDetail>,
    /// Server specific metadata.
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

impl<T> GraphQlResponse<T> {
    /// Returns the data, or the reported errors.
    ///
    /// A response with both data and errors counts as failed.
    pub fn into_result(self) -> Result<T, GraphQlError> {
        if !self.errors.is_empty() {
            return Err(GraphQlError::Graph(self.errors));
        }
        self.data.ok_or(GraphQlError::EmptyData)
    }
}

/// Decodes a response body and unwraps its data.
pub(crate) fn decode<T>(body: &[u8]) -> Result<T, GraphQlError>
where
    T: DeserializeOwned,
{
    serde_json::from_slice::<GraphQlResponse<T>>(body)?.into_result()
}
