//! Error types for provider operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or calling a provider.
#[derive(Debug, Error)]
pub enum Error {
    /// Provider configuration is malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An operation was attempted on a provider that was never initialized.
    #[error("{0} provider not properly initialized")]
    NotInitialized(String),

    /// Registry lookup miss: unknown key or a provider without credentials.
    #[error("LLM provider '{0}' not available")]
    ProviderUnavailable(String),

    /// The vendor call failed (network, auth, quota, malformed response).
    #[error("{provider} API error: {message}")]
    ProviderCall { provider: String, message: String },

    /// Requested model is not enabled in the current settings.
    #[error("model not enabled: {0}")]
    ModelNotEnabled(String),

    /// Model identifier does not belong to any known provider.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Credentials not found for provider.
    #[error("credentials not found for provider: {0}")]
    CredentialsNotFound(String),

    /// Failed to access system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Creates a vendor call error.
    pub fn provider_call(provider: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::ProviderCall {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }
}
