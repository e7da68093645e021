use thiserror::Error;

/// Default message when the service fails without an `error` field.
pub const GENERIC_FAILURE: &str = "API request failed";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a non-success status. The message is the
    /// service's own text and is shown to the user unchanged.
    #[error("{0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("Invalid response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Client is not configured: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
