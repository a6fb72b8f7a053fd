//! Error types for Gradebook

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GradebookError>;

#[derive(Error, Debug)]
pub enum GradebookError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GradebookError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            GradebookError::InvalidInput(_) => 3,
            GradebookError::Config(_) => 2,
            GradebookError::Api(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Failure of a single request against the remote API
///
/// Cloneable so it can travel inside events and outcomes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: String },

    /// A 2xx body did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The value cannot stand as one path segment; nothing was sent
    #[error("Invalid path segment: {0:?}")]
    InvalidPath(String),
}

/// Coarse classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure, no response
    Transport,
    /// Missing or invalid required field (HTTP 500 in this API)
    Validation,
    /// Relationship precondition violated (406/409)
    Conflict,
    /// Referenced entity or relation absent (404)
    NotFound,
    /// Response not in the expected shape
    Parse,
    /// Request could not be built
    Request,
    /// Any other status code
    Other,
}

impl ApiError {
    /// Build a status error from a code and raw body
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code, when a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, when a response was received
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Transport,
            ApiError::Parse(_) => ErrorKind::Parse,
            ApiError::InvalidPath(_) => ErrorKind::Request,
            ApiError::Status { status, .. } => match status {
                404 => ErrorKind::NotFound,
                406 | 409 => ErrorKind::Conflict,
                500 => ErrorKind::Validation,
                _ => ErrorKind::Other,
            },
        }
    }
}
