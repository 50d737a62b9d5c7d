//! Error types for the Ag3ntum console

use std::sync::Arc;
use thiserror::Error;

/// Main error type for the console core
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found in {0}")]
    ConfigNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error of a fetch whose result was shared by several callers
    #[error(transparent)]
    Shared(Arc<ConsoleError>),

    #[error("{0}")]
    Other(String),
}

impl ConsoleError {
    /// Unwrap a shared error when this caller is its last holder
    pub fn from_shared(err: Arc<ConsoleError>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(ConsoleError::Shared)
    }

    /// HTTP status carried by the error, looking through shared wrappers
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Http { status, .. } => Some(*status),
            ConsoleError::Shared(inner) => inner.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
