//! Error types for hrflow.
//!
//! Every error carries a stable code so callers (and the CLI's JSON output)
//! can branch on the failure kind without parsing messages.

use thiserror::Error;

/// Result type alias for hrflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// hrflow error types.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] crate::dispatch::DispatchError),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Parse(_) => "PARSE_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Dispatch(_) => "DISPATCH_ERROR",
            Error::Directory(_) => "DIRECTORY_ERROR",
            Error::Http(_) => "HTTP_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// Convert to the JSON error body the CLI prints on failure.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        })
    }
}
