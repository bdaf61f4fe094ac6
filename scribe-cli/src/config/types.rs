use std::collections::BTreeMap;

use scribe_models::providers::claude;
use scribe_models::{ModelOverrides, OcrSettings};
use serde::{Deserialize, Serialize};

/// Prompt sent with the image when none is given on the command line.
pub const DEFAULT_PROMPT: &str = "Extract all text from this image. \
Preserve the reading order and line breaks, and return only the extracted text.";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawScribeConfig {
    #[serde(default)]
    pub ocr: RawOcrConfig,

    #[serde(default)]
    pub prompt: RawPromptConfig,
}

/// `[ocr]` as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOcrConfig {
    /// Model used when `--model` is not given
    pub default_model: Option<String>,

    /// Models `--model` may name
    pub enabled_models: Option<Vec<String>>,

    /// Per-model overrides, e.g. `[ocr.model_configs."gpt-4o"]`
    #[serde(default)]
    pub model_configs: BTreeMap<String, ModelOverrides>,
}

/// `[prompt]` as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPromptConfig {
    pub user: Option<String>,
    pub system: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScribeConfig {
    pub ocr: OcrSettings,
    pub prompt: PromptConfig,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            ocr: OcrSettings::new(claude::DEFAULT_MODEL),
            prompt: PromptConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Task prompt sent alongside the image
    pub user: String,

    /// Optional system instruction
    pub system: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_PROMPT.to_string(),
            system: None,
        }
    }
}
