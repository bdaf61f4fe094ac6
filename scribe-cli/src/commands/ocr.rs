//! Run OCR on an image file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::Args;
use scribe_models::providers::OcrProvider;
use scribe_models::{CallOptions, OcrSettings, ProviderRegistry, Usage};
use tracing::{debug, warn};

use super::registry;
use crate::config::ScribeConfig;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// OCR arguments.
#[derive(Args, Debug)]
pub struct OcrArgs {
    /// PNG image to read
    pub image: PathBuf,

    /// Provider to use with its default model (claude, chatgpt, gemini)
    #[arg(long, conflicts_with = "model")]
    pub provider: Option<String>,

    /// Model to use; must be enabled in the config
    #[arg(long)]
    pub model: Option<String>,

    /// Task prompt (defaults to the configured prompt)
    #[arg(long)]
    pub prompt: Option<String>,

    /// System instruction (defaults to the configured one)
    #[arg(long)]
    pub system: Option<String>,
}

/// Run ocr command.
pub async fn run(args: OcrArgs, config: &ScribeConfig) -> Result<()> {
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    if !bytes.starts_with(PNG_SIGNATURE) {
        warn!(
            "{} does not look like a PNG; it is sent as image/png",
            args.image.display()
        );
    }
    let image = BASE64.encode(&bytes);

    let registry = registry();
    let (provider, options) = select_provider(
        &registry,
        &config.ocr,
        args.provider.as_deref(),
        args.model.as_deref(),
    )
    .await?;

    let prompt = args.prompt.as_deref().unwrap_or(&config.prompt.user);
    let system = args.system.as_deref().or(config.prompt.system.as_deref());

    debug!(
        provider = provider.name(),
        bytes = bytes.len(),
        "Running OCR on {}",
        args.image.display()
    );
    let response = provider
        .process_image_with(&image, prompt, system, &options)
        .await?;

    println!("{}", response.content);
    if let Some(usage) = response.usage {
        eprintln!("{}", format_usage(provider.name(), &usage));
    }

    Ok(())
}

/// Pick the provider and call options.
///
/// An explicit provider runs with its own default model; otherwise the model
/// comes from `--model` or the configured default.
async fn select_provider(
    registry: &ProviderRegistry,
    settings: &OcrSettings,
    provider: Option<&str>,
    model: Option<&str>,
) -> Result<(Arc<dyn OcrProvider>, CallOptions)> {
    if let Some(key) = provider {
        let provider = registry.get_provider(key).await?;
        return Ok((provider, CallOptions::default()));
    }

    let selection = settings.resolve(model)?;
    let provider = registry.provider(selection.kind).await?;
    Ok((provider, selection.options))
}

fn format_usage(provider: &str, usage: &Usage) -> String {
    format!(
        "{}: {} prompt + {} completion = {} tokens",
        provider, usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_models::ProviderKind;
    use scribe_models::config::MapSource;

    fn registry_with(keys: &[(&str, &str)]) -> ProviderRegistry {
        ProviderRegistry::new(keys.iter().copied().collect::<MapSource>())
    }

    #[tokio::test]
    async fn explicit_provider_uses_its_default_model() {
        let registry = registry_with(&[("GEMINI_API_KEY", "g")]);
        let settings = OcrSettings::new("gpt-4o");

        let (provider, options) = select_provider(&registry, &settings, Some("gemini"), None)
            .await
            .unwrap();
        assert_eq!(provider.kind(), ProviderKind::Gemini);
        assert_eq!(options, CallOptions::default());
    }

    #[tokio::test]
    async fn model_selects_provider_through_settings() {
        let registry = registry_with(&[("ANTHROPIC_API_KEY", "a"), ("OPENAI_API_KEY", "o")]);
        let mut settings = OcrSettings::new("gpt-4o");
        settings.enable(["claude-3-haiku-20240307"]);

        let (provider, options) =
            select_provider(&registry, &settings, None, Some("claude-3-haiku-20240307"))
                .await
                .unwrap();
        assert_eq!(provider.kind(), ProviderKind::Claude);
        assert_eq!(options.model.as_deref(), Some("claude-3-haiku-20240307"));

        let (provider, _) = select_provider(&registry, &settings, None, None)
            .await
            .unwrap();
        assert_eq!(provider.kind(), ProviderKind::ChatGpt);
    }

    #[tokio::test]
    async fn disabled_model_is_rejected_before_lookup() {
        let registry = registry_with(&[("GEMINI_API_KEY", "g")]);
        let settings = OcrSettings::new("gpt-4o");

        let err = select_provider(&registry, &settings, None, Some("gemini-1.5-pro"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "model not enabled: gemini-1.5-pro");
        assert!(!registry.is_initialized());
    }

    #[tokio::test]
    async fn unconfigured_default_reports_unavailable_provider() {
        let registry = registry_with(&[("GEMINI_API_KEY", "g")]);
        let settings = OcrSettings::new("gpt-4o");

        let err = select_provider(&registry, &settings, None, None)
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "LLM provider 'chatgpt' not available");
    }

    #[test]
    fn usage_line_lists_all_counters() {
        assert_eq!(
            format_usage("Claude", &Usage::new(1200, 34)),
            "Claude: 1200 prompt + 34 completion = 1234 tokens"
        );
    }
}
