//! OCR provider trait and the vendor implementations.
//!
//! The [`OcrProvider`] trait is the one contract every vendor adapter
//! satisfies, whatever shape its HTTP API takes.
//!
//! # Example
//!
//! ```ignore
//! use scribe_models::providers::{ClaudeProvider, OcrProvider};
//! use scribe_models::ProviderConfig;
//!
//! let mut provider = ClaudeProvider::new();
//! provider.initialize(ProviderConfig::new(api_key))?;
//!
//! let response = provider
//!     .process_image(&image_base64, "Extract all text", Some("You are an OCR engine"))
//!     .await?;
//! println!("{}", response.content);
//! ```

pub mod chatgpt;
pub mod claude;
pub mod gemini;
mod state;

use async_trait::async_trait;

pub use chatgpt::ChatGptProvider;
pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;

use crate::{CallOptions, ProviderConfig, ProviderKind, ProviderResponse, Result};

/// Trait for vision providers that turn an image into text.
///
/// # Required Methods
///
/// - [`name`](OcrProvider::name) - Display name (e.g., "Claude")
/// - [`kind`](OcrProvider::kind) - Registry key
/// - [`initialize`](OcrProvider::initialize) - Store config and build the vendor client
/// - [`is_available`](OcrProvider::is_available) - Whether calls can be made
/// - [`supported_models`](OcrProvider::supported_models) - Fixed model list, default first
/// - [`process_image_with`](OcrProvider::process_image_with) - One OCR call with overrides
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Returns the display name used in logs and errors.
    fn name(&self) -> &str;

    /// Returns the registry key for this provider.
    fn kind(&self) -> ProviderKind;

    /// Validate `config`, build the vendor client, and become available.
    ///
    /// Calling it again replaces the stored config and client. No network
    /// traffic happens here.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the config is malformed.
    fn initialize(&mut self, config: ProviderConfig) -> Result<()>;

    /// True once `initialize` succeeded with a non-empty credential.
    fn is_available(&self) -> bool;

    /// Model identifiers the provider advertises; never empty.
    fn supported_models(&self) -> &'static [&'static str];

    /// Run OCR on a base64 PNG with per-call overrides.
    ///
    /// # Errors
    ///
    /// - `Error::NotInitialized` if the provider is not available
    /// - `Error::ProviderCall` if the vendor call fails for any reason
    async fn process_image_with(
        &self,
        image_base64: &str,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &CallOptions,
    ) -> Result<ProviderResponse>;

    /// Run OCR on a base64 PNG using the stored config.
    async fn process_image(
        &self,
        image_base64: &str,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<ProviderResponse> {
        self.process_image_with(image_base64, prompt, system_prompt, &CallOptions::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Usage};

    /// A provider that echoes its inputs, for exercising the default methods.
    struct EchoProvider {
        ready: bool,
    }

    #[async_trait]
    impl OcrProvider for EchoProvider {
        fn name(&self) -> &str {
            "Echo"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Claude
        }

        fn initialize(&mut self, config: ProviderConfig) -> Result<()> {
            config.validate(self.kind())?;
            self.ready = true;
            Ok(())
        }

        fn is_available(&self) -> bool {
            self.ready
        }

        fn supported_models(&self) -> &'static [&'static str] {
            &["echo-1"]
        }

        async fn process_image_with(
            &self,
            image_base64: &str,
            prompt: &str,
            system_prompt: Option<&str>,
            options: &CallOptions,
        ) -> Result<ProviderResponse> {
            if !self.ready {
                return Err(Error::NotInitialized(self.name().to_string()));
            }
            Ok(ProviderResponse {
                content: format!(
                    "{}|{}|{}|{}",
                    system_prompt.unwrap_or("-"),
                    prompt,
                    image_base64,
                    options.model.as_deref().unwrap_or("default"),
                ),
                usage: Some(Usage::new(3, 4)),
            })
        }
    }

    #[tokio::test]
    async fn process_image_uses_empty_options() {
        let mut provider = EchoProvider { ready: false };
        provider.initialize(ProviderConfig::new("key")).unwrap();

        let response = provider.process_image("img", "read", None).await.unwrap();
        assert_eq!(response.content, "-|read|img|default");
        assert_eq!(response.usage.unwrap().total_tokens, 7);
    }

    #[tokio::test]
    async fn providers_are_usable_as_trait_objects() {
        let mut provider = EchoProvider { ready: false };
        provider.initialize(ProviderConfig::new("key")).unwrap();
        let provider: Box<dyn OcrProvider> = Box::new(provider);

        let response = provider
            .process_image_with("img", "read", Some("sys"), &CallOptions::model("echo-1"))
            .await
            .unwrap();
        assert_eq!(response.content, "sys|read|img|echo-1");
    }

    #[test]
    fn every_vendor_provider_lists_models() {
        let providers: Vec<Box<dyn OcrProvider>> = vec![
            Box::new(ClaudeProvider::new()),
            Box::new(ChatGptProvider::new()),
            Box::new(GeminiProvider::new()),
        ];
        for provider in providers {
            let models = provider.supported_models();
            assert!((4..=6).contains(&models.len()), "{}", provider.name());
            assert_eq!(models, provider.kind().supported_models());
            assert_eq!(models, provider.supported_models(), "list must be stable");
            assert!(!provider.is_available());
        }
    }
}
