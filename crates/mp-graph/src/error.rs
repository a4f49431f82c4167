//! Error types for mp-graph

use thiserror::Error;

/// Failure of a single Graph API call
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// Non-success status or an `error` object in the body
    #[error("Graph API error (HTTP {status}):\n{body}")]
    Api { status: u16, body: String },

    #[error("Graph API response is missing `{field}`:\n{body}")]
    MissingField { field: String, body: String },

    #[error("Graph API returned invalid JSON (HTTP {status}): {body}")]
    InvalidJson { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

// Requests carry the token in the URL for GET calls, so it must not leak
// into the error message.
impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        GraphError::Http(err.without_url())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GraphError>;
