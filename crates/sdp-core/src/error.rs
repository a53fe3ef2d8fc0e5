//! Error types for session description construction

use thiserror::Error;

/// Result type alias for session description operations
pub type Result<T> = std::result::Result<T, SdpError>;

/// Errors raised while assembling a session description
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdpError {
    /// The description has no origin (o=) line
    #[error("Session description has no origin")]
    MissingOrigin,

    /// An address field is empty or unusable
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl SdpError {
    /// Create a new invalid address error
    pub fn invalid_address(details: impl Into<String>) -> Self {
        Self::InvalidAddress(details.into())
    }
}
