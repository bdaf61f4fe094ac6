//! Core types shared by providers and the registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::auth::ApiKey;
use crate::providers::{chatgpt, claude, gemini};
use crate::{Error, Result};

/// Output budget used when neither the config nor the call sets one.
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Sampling temperature used when neither the config nor the call sets one.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;


/// Logical provider key.
///
/// The set is closed: the registry only ever knows these three providers.
///
/// # Examples
///
/// ```
/// use scribe_models::ProviderKind;
///
/// let kind: ProviderKind = "chatgpt".parse().unwrap();
/// assert_eq!(kind, ProviderKind::ChatGpt);
/// assert_eq!(kind.env_key(), "OPENAI_API_KEY");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Claude,
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Gemini,
}

impl ProviderKind {
    /// All providers, in registry order.
    pub const ALL: [ProviderKind; 3] = [Self::Claude, Self::ChatGpt, Self::Gemini];

    /// Registry key (`claude`, `chatgpt`, `gemini`).
    pub fn key(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::ChatGpt => "chatgpt",
            Self::Gemini => "gemini",
        }
    }

    /// Human-readable provider name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::ChatGpt => "ChatGPT",
            Self::Gemini => "Gemini",
        }
    }

    /// Configuration key holding the provider credential.
    pub fn env_key(self) -> &'static str {
        match self {
            Self::Claude => "ANTHROPIC_API_KEY",
            Self::ChatGpt => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Configuration key holding an optional base URL override.
    pub fn base_url_key(self) -> &'static str {
        match self {
            Self::Claude => "ANTHROPIC_BASE_URL",
            Self::ChatGpt => "OPENAI_BASE_URL",
            Self::Gemini => "GEMINI_BASE_URL",
        }
    }

    /// Highest sampling temperature the vendor accepts.
    pub fn max_temperature(self) -> f32 {
        match self {
            Self::Claude => 1.0,
            Self::ChatGpt | Self::Gemini => 2.0,
        }
    }

    /// Model identifiers the provider advertises.
    pub fn supported_models(self) -> &'static [&'static str] {
        match self {
            Self::Claude => claude::SUPPORTED_MODELS,
            Self::ChatGpt => chatgpt::SUPPORTED_MODELS,
            Self::Gemini => gemini::SUPPORTED_MODELS,
        }
    }

    /// Find the provider serving a model identifier.
    ///
    /// Exact matches against the supported lists win; otherwise the vendor
    /// prefix of the identifier decides.
    pub fn for_model(model: &str) -> Option<Self> {
        if let Some(kind) = Self::ALL
            .into_iter()
            .find(|kind| kind.supported_models().contains(&model))
        {
            return Some(kind);
        }

        let model = model.to_ascii_lowercase();
        if model.starts_with("claude") {
            Some(Self::Claude)
        } else if ["gpt", "chatgpt", "o1", "o3"]
            .iter()
            .any(|prefix| model.starts_with(prefix))
        {
            Some(Self::ChatGpt)
        } else if model.starts_with("gemini") {
            Some(Self::Gemini)
        } else {
            None
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| Error::ProviderUnavailable(s.to_string()))
    }
}

/// Configuration handed to [`OcrProvider::initialize`](crate::providers::OcrProvider::initialize).
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Vendor credential.
    pub api_key: ApiKey,
    /// Model override; the provider default is used when unset.
    pub model: Option<String>,
    /// Maximum output tokens.
    pub max_tokens: Option<u32>,
    /// Sampling temperature. `Some(0.0)` is an explicit request, not "unset".
    pub temperature: Option<f32>,
    /// Base URL override for proxies and test servers.
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Create a config carrying only a credential.
    pub fn new(api_key: impl Into<ApiKey>) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            max_tokens: None,
            temperature: None,
            base_url: None,
        }
    }

    /// Set the model override.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the maximum output tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the base URL override.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Reject configs the `kind` vendor would not accept.
    pub fn validate(&self, kind: ProviderKind) -> Result<()> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(Error::config("API key is empty"));
        }
        validate_overrides(
            kind,
            self.model.as_deref(),
            self.max_tokens,
            self.temperature,
        )?;
        if let Some(base_url) = &self.base_url {
            reqwest::Url::parse(base_url)
                .map_err(|e| Error::config(format!("invalid base URL '{base_url}': {e}")))?;
        }
        Ok(())
    }
}

/// Checks shared by stored configs and per-call options.
fn validate_overrides(
    kind: ProviderKind,
    model: Option<&str>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
) -> Result<()> {
    if let Some(model) = model {
        validate_model(model)?;
    }
    if max_tokens == Some(0) {
        return Err(Error::config("max_tokens must be greater than zero"));
    }
    if let Some(temperature) = temperature {
        validate_temperature(kind, temperature)?;
    }
    Ok(())
}

/// Model ids end up in URL paths, so only plain identifier characters pass.
/// A leading `models/` resource prefix is allowed.
fn validate_model(model: &str) -> Result<()> {
    let id = model.strip_prefix("models/").unwrap_or(model);
    if id.is_empty() {
        return Err(Error::config("model identifier is empty"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | ':'))
    {
        return Err(Error::config(format!("invalid model identifier '{model}'")));
    }
    Ok(())
}

fn validate_temperature(kind: ProviderKind, temperature: f32) -> Result<()> {
    let max = kind.max_temperature();
    if !temperature.is_finite() || !(0.0..=max).contains(&temperature) {
        return Err(Error::config(format!(
            "{} temperature must be between 0 and {max}, got {temperature}",
            kind.display_name()
        )));
    }
    Ok(())
}

/// Per-call overrides that take precedence over the stored config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CallOptions {
    /// Options that only select a model.
    pub fn model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }

    /// Apply the same rules as [`ProviderConfig::validate`] to the overrides.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a malformed model id, `max_tokens` of zero,
    /// or a temperature outside the vendor's range.
    pub fn validate(&self, kind: ProviderKind) -> Result<()> {
        validate_overrides(kind, self.model.as_deref(), self.max_tokens, self.temperature)
    }
}

/// Effective parameters for one vendor call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CallParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CallParams {
    /// Resolve call options over the stored config over provider defaults.
    ///
    /// The stored config was validated at initialize; the options are
    /// validated here.
    pub fn resolve(
        kind: ProviderKind,
        config: &ProviderConfig,
        options: &CallOptions,
        default_model: &str,
    ) -> Result<Self> {
        options.validate(kind)?;
        Ok(Self {
            model: options
                .model
                .clone()
                .or_else(|| config.model.clone())
                .unwrap_or_else(|| default_model.to_string()),
            max_tokens: options
                .max_tokens
                .or(config.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: options
                .temperature
                .or(config.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
        })
    }
}

/// Token usage reported by a vendor for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Usage with the total computed from its parts.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Normalized provider output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Extracted text; non-text parts of the vendor response are dropped.
    pub content: String,
    /// Absent when the vendor did not report token accounting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A registered provider as advertised to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub kind: ProviderKind,
    pub name: String,
    pub models: Vec<String>,
}

/// A model that can be selected for OCR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableModel {
    pub model: String,
    pub display_name: String,
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_round_trips_through_key() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.key().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_provider_key_is_unavailable() {
        let err = "mistral".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable(ref key) if key == "mistral"));
    }

    #[test]
    fn provider_kind_serializes_as_key() {
        assert_eq!(serde_json::to_string(&ProviderKind::ChatGpt).unwrap(), "\"chatgpt\"");
        assert_eq!(serde_json::to_string(&ProviderKind::Claude).unwrap(), "\"claude\"");
    }

    #[test]
    fn for_model_prefers_supported_lists() {
        assert_eq!(ProviderKind::for_model("gpt-4o"), Some(ProviderKind::ChatGpt));
        assert_eq!(
            ProviderKind::for_model("claude-3-opus-20240229"),
            Some(ProviderKind::Claude)
        );
        assert_eq!(ProviderKind::for_model("gemini-1.5-pro"), Some(ProviderKind::Gemini));
    }

    #[test]
    fn for_model_falls_back_to_prefix() {
        assert_eq!(
            ProviderKind::for_model("claude-opus-4-20250514"),
            Some(ProviderKind::Claude)
        );
        assert_eq!(ProviderKind::for_model("o3-mini"), Some(ProviderKind::ChatGpt));
        assert_eq!(ProviderKind::for_model("gemini-2.5-pro"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::for_model("llama3"), None);
    }

    #[test]
    fn config_validation_rejects_blank_key() {
        let err = ProviderConfig::new("   ")
            .validate(ProviderKind::Claude)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn config_validation_rejects_bad_values() {
        let kind = ProviderKind::ChatGpt;
        assert!(ProviderConfig::new("k").with_max_tokens(0).validate(kind).is_err());
        assert!(ProviderConfig::new("k").with_temperature(-0.1).validate(kind).is_err());
        assert!(ProviderConfig::new("k").with_temperature(f32::NAN).validate(kind).is_err());
        assert!(ProviderConfig::new("k").with_base_url("not a url").validate(kind).is_err());
        assert!(ProviderConfig::new("k").with_model("").validate(kind).is_err());
    }

    #[test]
    fn temperature_ceiling_depends_on_vendor() {
        let config = ProviderConfig::new("k").with_temperature(1.5);
        assert!(config.validate(ProviderKind::ChatGpt).is_ok());
        assert!(config.validate(ProviderKind::Gemini).is_ok());

        let err = config.validate(ProviderKind::Claude).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("between 0 and 1"), "{err}");
    }

    #[test]
    fn model_ids_must_be_path_safe() {
        for model in ["gemini-1.5-pro", "models/gemini-1.5-pro", "ft:gpt-4o:acme:ocr:abc1"] {
            assert!(CallOptions::model(model).validate(ProviderKind::Gemini).is_ok(), "{model}");
        }
        for model in ["gemini/../x", "gemini?alt=sse", "gemini#frag", "gemini 1.5", "models/"] {
            let err = CallOptions::model(model)
                .validate(ProviderKind::Gemini)
                .unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{model}");
        }
    }

    #[test]
    fn config_validation_accepts_explicit_zero_temperature() {
        ProviderConfig::new("k")
            .with_temperature(0.0)
            .with_max_tokens(1024)
            .with_base_url("http://127.0.0.1:8080")
            .validate(ProviderKind::Claude)
            .unwrap();
    }

    #[test]
    fn call_params_fall_back_to_defaults() {
        let params = CallParams::resolve(
            ProviderKind::Claude,
            &ProviderConfig::new("k"),
            &CallOptions::default(),
            "m",
        )
        .unwrap();
        assert_eq!(params.model, "m");
        assert_eq!(params.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(params.temperature, 0.0);
    }

    #[test]
    fn call_params_prefer_options_over_config() {
        let config = ProviderConfig::new("k")
            .with_model("configured")
            .with_max_tokens(100)
            .with_temperature(0.7);
        let options = CallOptions {
            model: Some("per-call".to_string()),
            max_tokens: None,
            temperature: Some(0.0),
        };
        let params = CallParams::resolve(ProviderKind::Claude, &config, &options, "default").unwrap();
        assert_eq!(params.model, "per-call");
        assert_eq!(params.max_tokens, 100);
        assert_eq!(params.temperature, 0.0);
    }

    #[test]
    fn call_params_reject_invalid_options() {
        let config = ProviderConfig::new("k").with_max_tokens(1000);
        let cases = [
            CallOptions {
                max_tokens: Some(0),
                ..Default::default()
            },
            CallOptions {
                temperature: Some(f32::NAN),
                ..Default::default()
            },
            CallOptions {
                temperature: Some(9.0),
                ..Default::default()
            },
            CallOptions {
                temperature: Some(1.5),
                ..Default::default()
            },
            CallOptions::model("claude-3-opus-20240229?x=1"),
        ];
        for options in cases {
            let err = CallParams::resolve(ProviderKind::Claude, &config, &options, "m").unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{options:?}");
        }
    }

    #[test]
    fn usage_calculates_total() {
        let usage = Usage::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(usage.prompt_tokens + usage.completion_tokens, usage.total_tokens);
    }

    #[test]
    fn available_model_serializes_camel_case() {
        let model = AvailableModel {
            model: "gpt-4o".to_string(),
            display_name: "GPT-4o".to_string(),
            provider: ProviderKind::ChatGpt,
            description: None,
        };
        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("\"displayName\":\"GPT-4o\""));
        assert!(json.contains("\"provider\":\"chatgpt\""));
        assert!(!json.contains("description"));
    }
}
