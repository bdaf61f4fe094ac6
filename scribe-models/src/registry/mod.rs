//! Provider registry: resolves a provider key to a ready-to-use provider.
//!
//! The registry sweeps the fixed provider set once, reading each provider's
//! credential from a [`ConfigSource`]. Providers without a credential are
//! skipped and providers that fail to initialize are logged and left out,
//! so running with only one vendor configured is a normal state.
//!
//! # Example
//!
//! ```ignore
//! use scribe_models::config::EnvSource;
//! use scribe_models::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new(EnvSource);
//! let provider = registry.get_provider("claude").await?;
//! let response = provider.process_image(&image, "Extract all text", None).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::catalog;
use crate::config::{ConfigSource, EnvSource};
use crate::providers::{ChatGptProvider, ClaudeProvider, GeminiProvider, OcrProvider};
use crate::{AvailableModel, Error, ProviderConfig, ProviderInfo, ProviderKind, Result};

type ProviderMap = BTreeMap<ProviderKind, Arc<dyn OcrProvider>>;

/// Owns the initialized providers and answers lookups by key.
pub struct ProviderRegistry {
    source: Box<dyn ConfigSource>,
    providers: OnceCell<ProviderMap>,
}

impl ProviderRegistry {
    /// Create a registry reading credentials from `source`.
    ///
    /// Nothing is initialized until [`initialize`](Self::initialize) or the
    /// first [`get_provider`](Self::get_provider).
    pub fn new(source: impl ConfigSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            providers: OnceCell::new(),
        }
    }

    /// Create a registry reading credentials from the process environment.
    pub fn from_env() -> Self {
        Self::new(EnvSource)
    }

    /// Initialize every configured provider.
    ///
    /// Idempotent: later calls, including concurrent ones racing the first,
    /// return without repeating the sweep.
    pub async fn initialize(&self) {
        self.ensure_initialized().await;
    }

    /// Whether the initialization sweep has completed.
    pub fn is_initialized(&self) -> bool {
        self.providers.initialized()
    }

    /// Look up a provider by key, initializing the registry first if needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProviderUnavailable` naming `key` when the key is
    /// unknown or the provider is not configured.
    pub async fn get_provider(&self, key: &str) -> Result<Arc<dyn OcrProvider>> {
        let kind: ProviderKind = key.parse()?;
        self.provider(kind).await
    }

    /// Typed variant of [`get_provider`](Self::get_provider).
    pub async fn provider(&self, kind: ProviderKind) -> Result<Arc<dyn OcrProvider>> {
        self.ensure_initialized()
            .await
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::ProviderUnavailable(kind.to_string()))
    }

    /// Registered providers that are available, in registry order.
    ///
    /// Empty until the registry has been initialized.
    pub fn available_providers(&self) -> Vec<ProviderInfo> {
        self.available()
            .map(|(kind, provider)| ProviderInfo {
                kind,
                name: provider.name().to_string(),
                models: provider
                    .supported_models()
                    .iter()
                    .map(|m| m.to_string())
                    .collect(),
            })
            .collect()
    }

    /// Every model of every available provider, with display metadata.
    pub fn available_models(&self) -> Vec<AvailableModel> {
        self.available()
            .flat_map(|(kind, provider)| {
                provider
                    .supported_models()
                    .iter()
                    .map(move |model| catalog::describe(kind, model))
            })
            .collect()
    }

    /// Whether `key` names a registered, available provider.
    ///
    /// Unknown and unconfigured keys both report `false`;
    /// [`get_provider`](Self::get_provider) is the call that tells them apart.
    pub fn is_provider_available(&self, key: &str) -> bool {
        let Ok(kind) = key.parse::<ProviderKind>() else {
            return false;
        };
        self.providers
            .get()
            .and_then(|providers| providers.get(&kind))
            .is_some_and(|provider| provider.is_available())
    }

    fn available(&self) -> impl Iterator<Item = (ProviderKind, &Arc<dyn OcrProvider>)> {
        self.providers
            .get()
            .into_iter()
            .flat_map(|providers| providers.iter())
            .filter(|(_, provider)| provider.is_available())
            .map(|(kind, provider)| (*kind, provider))
    }

    async fn ensure_initialized(&self) -> &ProviderMap {
        self.providers
            .get_or_init(|| async { self.sweep() })
            .await
    }

    fn sweep(&self) -> ProviderMap {
        let mut providers = ProviderMap::new();

        for kind in ProviderKind::ALL {
            let Some(api_key) = self.source.get(kind.env_key()).filter(|k| !k.is_empty()) else {
                warn!(
                    provider = %kind,
                    "{} API key not found ({})",
                    kind.display_name(),
                    kind.env_key()
                );
                continue;
            };

            let mut config = ProviderConfig::new(api_key);
            if let Some(base_url) = self
                .source
                .get(kind.base_url_key())
                .filter(|url| !url.is_empty())
            {
                config = config.with_base_url(base_url);
            }

            let mut provider = build_provider(kind);
            match provider.initialize(config) {
                Ok(()) => {
                    info!(
                        provider = %kind,
                        "{} provider initialized successfully",
                        provider.name()
                    );
                    providers.insert(kind, Arc::from(provider));
                }
                Err(e) => {
                    warn!(
                        provider = %kind,
                        error = %e,
                        "Failed to initialize {} provider",
                        provider.name()
                    );
                }
            }
        }

        providers
    }
}

fn build_provider(kind: ProviderKind) -> Box<dyn OcrProvider> {
    match kind {
        ProviderKind::Claude => Box::new(ClaudeProvider::new()),
        ProviderKind::ChatGpt => Box::new(ChatGptProvider::new()),
        ProviderKind::Gemini => Box::new(GeminiProvider::new()),
    }
}
