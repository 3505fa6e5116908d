//! Client error types.

use thiserror::Error;

/// Errors surfaced by the state client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server could not be reached at all.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server answered with a non-success status; `body` is its error text.
    #[error("{route} rejected ({status}): {body}")]
    Rejected {
        route: String,
        status: u16,
        body: String,
    },

    /// A state document did not conform to the schema.
    #[error("Schema validation failed:\n{0}")]
    Validation(String),

    /// The schema itself could not be fetched or compiled.
    #[error("Schema unavailable: {0}")]
    Schema(String),

    /// A response body was not the JSON we expected.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A path string could not be parsed.
    #[error("Invalid state path: {0}")]
    InvalidPath(String),

    /// Push channel failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Configuration rejected by validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session is shutting down.
    #[error("Session shutting down")]
    ShuttingDown,
}

impl ClientError {
    /// Whether the server was reached and refused the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::WebSocket(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Parse(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::WebSocket(e.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
