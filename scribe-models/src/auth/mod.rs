//! Credential management for vendor API keys.
//!
//! Keys live in the system keyring with an environment variable fallback
//! for servers and CI. [`CredentialStore`] is also a [`ConfigSource`], so it
//! can back the provider registry directly.
//!
//! # Example
//!
//! ```ignore
//! use scribe_models::auth::CredentialStore;
//! use scribe_models::ProviderKind;
//!
//! let store = CredentialStore::new("scribe").with_env_fallback();
//! store.set(ProviderKind::Claude, "sk-ant-...")?;
//! let key = store.get(ProviderKind::Claude)?;
//! ```

use std::env;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::ConfigSource;
use crate::{Error, ProviderKind, Result};

/// A secure API key that prevents accidental logging.
///
/// The key is wrapped in `SecretString` which:
/// - Implements `Debug` as `"[REDACTED]"`
/// - Zeroizes memory on drop
/// - Requires explicit `.expose_secret()` to access the value
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret key value.
    ///
    /// Use sparingly - only when actually sending to an API.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the key carries any non-whitespace characters.
    pub fn is_empty(&self) -> bool {
        self.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Secure credential storage with system keyring and environment fallback.
///
/// # Storage Priority
///
/// When retrieving credentials:
/// 1. System keyring (if available)
/// 2. Environment variables (if `env_fallback` is enabled)
///
/// Storing always goes to the keyring; environment variables are read-only.
pub struct CredentialStore {
    service_name: String,
    env_fallback: bool,
}

impl CredentialStore {
    /// Create a new credential store for a keyring service (e.g. "scribe").
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            env_fallback: false,
        }
    }

    /// Enable environment variable fallback.
    pub fn with_env_fallback(mut self) -> Self {
        self.env_fallback = true;
        self
    }

    /// Get the API key for a provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialsNotFound` if no credentials are found.
    pub fn get(&self, provider: ProviderKind) -> Result<ApiKey> {
        if let Some(key) = self.get_from_keyring(provider) {
            debug!(provider = %provider, "retrieved API key from keyring");
            return Ok(key);
        }

        if self.env_fallback
            && let Some(key) = self.get_from_env(provider)
        {
            debug!(provider = %provider, "retrieved API key from environment");
            return Ok(key);
        }

        Err(Error::CredentialsNotFound(provider.to_string()))
    }

    /// Store an API key for a provider in the system keyring.
    pub fn set(&self, provider: ProviderKind, key: &str) -> Result<()> {
        let entry = self.keyring_entry(provider)?;
        entry
            .set_password(key)
            .map_err(|e| Error::Keyring(e.to_string()))?;
        debug!(provider = %provider, "stored API key in keyring");
        Ok(())
    }

    /// Delete an API key from the system keyring.
    pub fn delete(&self, provider: ProviderKind) -> Result<()> {
        let entry = self.keyring_entry(provider)?;
        entry.delete_credential().map_err(|e| match e {
            keyring::Error::NoEntry => Error::CredentialsNotFound(provider.to_string()),
            _ => Error::Keyring(e.to_string()),
        })?;
        debug!(provider = %provider, "deleted API key from keyring");
        Ok(())
    }

    /// Check if credentials exist for a provider.
    pub fn has(&self, provider: ProviderKind) -> bool {
        self.get(provider).is_ok()
    }

    /// Providers with a credential in the keyring or (if enabled) the environment.
    pub fn list_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|&provider| self.has(provider))
            .collect()
    }

    /// Get the source of a credential (keyring or env).
    pub fn credential_source(&self, provider: ProviderKind) -> Option<CredentialSource> {
        if self.get_from_keyring(provider).is_some() {
            Some(CredentialSource::Keyring)
        } else if self.env_fallback && self.get_from_env(provider).is_some() {
            Some(CredentialSource::Environment)
        } else {
            None
        }
    }

    fn keyring_entry(&self, provider: ProviderKind) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service_name, provider.key())
            .map_err(|e| Error::Keyring(e.to_string()))
    }

    fn get_from_keyring(&self, provider: ProviderKind) -> Option<ApiKey> {
        let entry = self.keyring_entry(provider).ok()?;
        entry.get_password().ok().map(ApiKey::new)
    }

    fn get_from_env(&self, provider: ProviderKind) -> Option<ApiKey> {
        env::var(provider.env_key()).ok().map(ApiKey::new)
    }
}

impl ConfigSource for CredentialStore {
    /// Credential keys resolve through [`CredentialStore::get`]; any other key
    /// is only answered from the environment when fallback is enabled.
    fn get(&self, key: &str) -> Option<String> {
        match ProviderKind::ALL.into_iter().find(|p| p.env_key() == key) {
            Some(provider) => CredentialStore::get(self, provider)
                .ok()
                .map(|k| k.expose_secret().to_string()),
            None if self.env_fallback => env::var(key).ok(),
            None => None,
        }
    }
}

/// Source of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Stored in system keyring.
    Keyring,
    /// From environment variable.
    Environment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret-key-12345");
        let debug = format!("{:?}", key);
        assert_eq!(debug, "ApiKey([REDACTED])");
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn api_key_expose_secret_returns_value() {
        let key: ApiKey = "my-key".into();
        assert_eq!(key.expose_secret(), "my-key");
        assert!(!key.is_empty());
        assert!(ApiKey::new("  ").is_empty());
    }

    #[test]
    fn credential_store_with_env_fallback() {
        let store = CredentialStore::new("test").with_env_fallback();
        assert!(store.env_fallback);
        assert_eq!(store.service_name, "test");
    }

    #[test]
    fn credential_store_env_fallback_works() {
        // SAFETY: no other test in this crate touches GEMINI_API_KEY
        unsafe { env::set_var("GEMINI_API_KEY", "test-key-from-env") };

        let store = CredentialStore::new("test-scribe-nonexistent").with_env_fallback();
        let result = store.get(ProviderKind::Gemini);
        let source = store.credential_source(ProviderKind::Gemini);
        let via_config = ConfigSource::get(&store, "GEMINI_API_KEY");

        // SAFETY: see above
        unsafe { env::remove_var("GEMINI_API_KEY") };

        assert_eq!(result.unwrap().expose_secret(), "test-key-from-env");
        assert_eq!(source, Some(CredentialSource::Environment));
        assert_eq!(via_config.as_deref(), Some("test-key-from-env"));
    }

    #[test]
    fn credential_store_without_fallback_fails() {
        let store = CredentialStore::new("test-scribe-nonexistent");
        let err = store.get(ProviderKind::ChatGpt).unwrap_err();
        assert!(matches!(err, Error::CredentialsNotFound(ref p) if p == "chatgpt"));
        assert_eq!(ConfigSource::get(&store, "SCRIBE_UNRELATED_KEY"), None);
    }
}
