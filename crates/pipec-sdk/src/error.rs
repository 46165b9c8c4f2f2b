//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Compilation Service client error
    #[error("Client error: {0}")]
    ClientError(#[from] pipec_client::ClientError),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
