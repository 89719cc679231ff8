//! Unified error handling for the client library.
//!
//! Every public operation returns `Result<T, ClientError>`. Callers that show
//! errors to people should use [`ClientError::user_message`] rather than the
//! `Display` output, which may carry transport details.

use glt_core::{EmailError, SandboxStatus};
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Library-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Remote service call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Durable storage could not be opened or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Email failed validation.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A chat message was empty after trimming.
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The sandbox never reached the requested status.
    #[error("Sandbox did not become {target} after {polls} checks")]
    SandboxTimeout { target: SandboxStatus, polls: u32 },
}

impl ClientError {
    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.server_message(),
            Self::Storage(_) => "Could not save local data".to_string(),
            Self::Config(err) => err.to_string(),
            Self::InvalidEmail(err) => err.to_string(),
            Self::EmptyMessage | Self::EmptyCart | Self::SandboxTimeout { .. } => self.to_string(),
        }
    }

    /// Whether the error means the user must log in (again).
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        match self {
            Self::Api(err) => err.is_auth_failure(),
            _ => false,
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
