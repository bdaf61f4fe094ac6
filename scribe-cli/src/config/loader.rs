use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use scribe_models::OcrSettings;
use tracing::debug;

use super::types::{
    PromptConfig, RawOcrConfig, RawPromptConfig, RawScribeConfig, ScribeConfig,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration.
    ///
    /// An explicit path is read on its own and must exist. Otherwise the user
    /// config and the project config are layered, project last, and missing
    /// files are skipped.
    pub fn load(explicit: Option<&Path>) -> Result<ScribeConfig> {
        if let Some(path) = explicit {
            return Ok(Self::finalize(Self::read(path)?));
        }

        let mut raw = RawScribeConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "scribe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with SCRIBE_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("SCRIBE_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".scribe/config.toml")
        }
    }

    fn read(path: &Path) -> Result<RawScribeConfig> {
        debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawScribeConfig, overlay: RawScribeConfig) -> RawScribeConfig {
        let mut model_configs = base.ocr.model_configs;
        model_configs.extend(overlay.ocr.model_configs);

        RawScribeConfig {
            ocr: RawOcrConfig {
                default_model: overlay.ocr.default_model.or(base.ocr.default_model),
                enabled_models: overlay.ocr.enabled_models.or(base.ocr.enabled_models),
                model_configs,
            },
            prompt: RawPromptConfig {
                user: overlay.prompt.user.or(base.prompt.user),
                system: overlay.prompt.system.or(base.prompt.system),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawScribeConfig) -> ScribeConfig {
        let defaults = ScribeConfig::default();

        let mut ocr = match raw.ocr.default_model {
            Some(model) => OcrSettings::new(model),
            None => defaults.ocr,
        };
        if let Some(enabled) = raw.ocr.enabled_models {
            ocr.enable(enabled);
        }
        ocr.model_configs = raw.ocr.model_configs;

        ScribeConfig {
            ocr,
            prompt: PromptConfig {
                user: raw.prompt.user.unwrap_or(defaults.prompt.user),
                system: raw.prompt.system.filter(|s| !s.is_empty()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::DEFAULT_PROMPT;
    use scribe_models::{Error, ProviderKind};
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            r#"
[ocr]
default_model = "gemini-1.5-pro"
enabled_models = ["gpt-4o-mini"]

[ocr.model_configs."gpt-4o-mini"]
max_tokens = 1024
temperature = 0.3

[prompt]
system = "You are an OCR engine"
"#,
        );

        let config = ConfigLoader::load(Some(&path)).unwrap();

        assert_eq!(config.ocr.default_model, "gemini-1.5-pro");
        assert_eq!(
            config.ocr.enabled_models,
            vec!["gpt-4o-mini", "gemini-1.5-pro"]
        );
        assert_eq!(config.prompt.user, DEFAULT_PROMPT);
        assert_eq!(config.prompt.system.as_deref(), Some("You are an OCR engine"));

        let selection = config.ocr.resolve(Some("gpt-4o-mini")).unwrap();
        assert_eq!(selection.kind, ProviderKind::ChatGpt);
        assert_eq!(selection.options.max_tokens, Some(1024));
        assert_eq!(selection.options.temperature, Some(0.3));
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");

        let err = ConfigLoader::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[ocr\ndefault_model = ");

        let err = ConfigLoader::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn test_finalize_applies_defaults() {
        let config = ConfigLoader::finalize(RawScribeConfig::default());
        let defaults = ScribeConfig::default();

        assert_eq!(config.ocr, defaults.ocr);
        assert_eq!(config.prompt.user, DEFAULT_PROMPT);
    }

    #[test]
    fn test_finalize_drops_empty_system_prompt() {
        let raw: RawScribeConfig = toml::from_str("[prompt]\nsystem = \"\"\n").unwrap();
        assert!(ConfigLoader::finalize(raw).prompt.system.is_none());
    }

    #[test]
    fn test_merge_overlay_wins_when_set() {
        let base: RawScribeConfig = toml::from_str(
            r#"
[ocr]
default_model = "gpt-4o"
enabled_models = ["gpt-4o-mini"]

[ocr.model_configs."gpt-4o"]
max_tokens = 1000

[prompt]
user = "Read the receipt"
"#,
        )
        .unwrap();
        let overlay: RawScribeConfig = toml::from_str(
            r#"
[ocr]
default_model = "claude-3-haiku-20240307"

[ocr.model_configs."claude-3-haiku-20240307"]
temperature = 0.1
"#,
        )
        .unwrap();

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(
            merged.ocr.default_model.as_deref(),
            Some("claude-3-haiku-20240307")
        );
        assert_eq!(merged.ocr.enabled_models, Some(vec!["gpt-4o-mini".to_string()]));
        assert_eq!(merged.ocr.model_configs.len(), 2);
        assert_eq!(merged.prompt.user.as_deref(), Some("Read the receipt"));
    }

    #[test]
    fn test_disabled_model_is_rejected_after_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[ocr]\ndefault_model = \"gpt-4o\"\n");

        let config = ConfigLoader::load(Some(&path)).unwrap();
        let err = config.ocr.resolve(Some("gemini-1.5-flash")).unwrap_err();
        assert!(matches!(err, Error::ModelNotEnabled(_)));
    }
}
