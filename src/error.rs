use std::io;
use thiserror::Error;

/// Custom result type alias for the service
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur while fetching, formatting or analyzing a repository
#[derive(Debug, Error)]
pub enum ServiceError {
    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// General message errors
    #[error("{0}")]
    Message(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// GitHub API specific errors
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Repository or path does not exist upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Text generation service errors (transport or malformed response)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Content decoding errors
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Creates a new error with the specified message
    pub fn new(message: &str) -> Self {
        Self::Message(message.to_string())
    }

    /// Checks if this error is transient and worth retrying by the caller
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http(_) | Self::IO(_))
    }

    /// Checks if this error is fatal for the current request
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }
}
