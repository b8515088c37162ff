//! Error types for ideabook-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using ideabook-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ideabook-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry not found
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local cache error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote content API error
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Credential store error
    #[error("Credential error: {0}")]
    Credential(String),
}
