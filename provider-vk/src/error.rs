//! Error types for the vk.com provider

use thiserror::Error;

/// vk.com API error code for an invalid or expired access token.
pub const ERROR_CODE_AUTH_FAILED: i64 = 5;

/// vk.com API error code for "too many requests per second".
pub const ERROR_CODE_TOO_MANY_REQUESTS: i64 = 6;

/// vk.com API error code for flood control on repeated actions.
pub const ERROR_CODE_FLOOD_CONTROL: i64 = 9;

/// vk.com provider errors
#[derive(Error, Debug)]
pub enum VkError {
    /// The access token was rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Request rate or flood control limit hit
    #[error("Rate limited (code {code}): {message}")]
    RateLimited { code: i64, message: String },

    /// The API answered with an `error` envelope
    #[error("vk.com API error (code {code}): {message}")]
    ApiError { code: i64, message: String },

    /// Non-2xx HTTP status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Reply cannot be produced in the current environment
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Background request task ended abnormally
    #[error("Request task failed: {0}")]
    TaskFailed(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

impl VkError {
    /// Map an `error` envelope to the matching variant.
    pub fn from_api(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            ERROR_CODE_AUTH_FAILED => VkError::AuthenticationFailed(message),
            ERROR_CODE_TOO_MANY_REQUESTS | ERROR_CODE_FLOOD_CONTROL => {
                VkError::RateLimited { code, message }
            }
            _ => VkError::ApiError { code, message },
        }
    }

    /// Whether repeating the request later may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            VkError::RateLimited { .. } => true,
            VkError::Http { status } => *status == 429 || *status >= 500,
            VkError::BridgeError(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type for vk.com operations
pub type Result<T> = std::result::Result<T, VkError>;

impl From<VkError> for bridge_traits::error::BridgeError {
    fn from(error: VkError) -> Self {
        match error {
            VkError::BridgeError(e) => e,
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}
