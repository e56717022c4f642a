//! Error types for the media server provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Media server provider errors
#[derive(Error, Debug)]
pub enum MediaServerError {
    /// API request returned an error status
    #[error("Media server API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Connector was configured with an unusable value
    #[error("Invalid connector configuration: {0}")]
    InvalidConfig(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for media server operations
pub type Result<T> = std::result::Result<T, MediaServerError>;

impl From<MediaServerError> for BridgeError {
    fn from(error: MediaServerError) -> Self {
        match error {
            MediaServerError::ApiError {
                status_code,
                message,
            } => BridgeError::Http {
                status: status_code,
                message,
            },
            MediaServerError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            MediaServerError::InvalidConfig(msg) => BridgeError::NotAvailable(msg),
            MediaServerError::BridgeError(e) => e,
        }
    }
}
