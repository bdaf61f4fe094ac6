pub mod models;
pub mod ocr;

use scribe_models::ProviderRegistry;
use scribe_models::auth::CredentialStore;

/// Keyring service name for stored API keys.
const SERVICE_NAME: &str = "scribe";

/// Credentials from the system keyring, falling back to the environment.
pub fn credential_store() -> CredentialStore {
    CredentialStore::new(SERVICE_NAME).with_env_fallback()
}

/// Registry backed by [`credential_store`].
pub fn registry() -> ProviderRegistry {
    ProviderRegistry::new(credential_store())
}
