//! Error types for the tile composer

use thiserror::Error;

/// Result type alias for composer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing, rendering or talking to the tile store
///
/// Every variant is local to a single user action: nothing here is fatal to the
/// process and editor state is never left half-updated.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected locally before any request was made
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Request failed, returned an `{error}` body, or the response was malformed
    #[error("Network error: {0}")]
    NetworkError(String),

    /// An icon asset could not be decoded into pixels
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    /// Failed to produce output pixels or encode them
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The human-readable message shown to the user for this failure.
    ///
    /// Store errors carry the server's `{error}` text verbatim, so the payload is
    /// returned without the variant prefix.
    pub fn user_message(&self) -> &str {
        match self {
            Error::ValidationError(m)
            | Error::NetworkError(m)
            | Error::DecodeError(m)
            | Error::RenderError(m)
            | Error::ConfigError(m)
            | Error::NotFound(m)
            | Error::Other(m) => m,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::DecodeError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::NetworkError(format!("Malformed response: {}", err))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}
