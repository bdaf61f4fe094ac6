//! Per-tenant model selection.
//!
//! Settings name a default model and the set of enabled models, plus optional
//! per-model overrides. Storing them is the caller's job; this module only
//! turns a requested model into a provider key and call options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CallOptions, Error, ProviderKind, Result};

/// Overrides applied when a specific model is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Which models a tenant may use for OCR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Models a request may name. The default model is always allowed.
    pub enabled_models: Vec<String>,
    /// Per-model overrides, keyed by model identifier.
    pub model_configs: BTreeMap<String, ModelOverrides>,
}

/// A resolved model choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub kind: ProviderKind,
    pub options: CallOptions,
}

impl OcrSettings {
    /// Settings with a single enabled model that is also the default.
    pub fn new(default_model: impl Into<String>) -> Self {
        let default_model = default_model.into();
        Self {
            enabled_models: vec![default_model.clone()],
            default_model,
            model_configs: BTreeMap::new(),
        }
    }

    /// Replace the enabled set; the default model stays enabled.
    pub fn enable<I, S>(&mut self, models: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_models = models.into_iter().map(Into::into).collect();
        self.keep_default_enabled();
    }

    /// Change the default model, enabling it if needed.
    pub fn set_default(&mut self, model: impl Into<String>) {
        self.default_model = model.into();
        self.keep_default_enabled();
    }

    /// Whether `model` may be requested.
    pub fn is_enabled(&self, model: &str) -> bool {
        (!self.default_model.is_empty() && model == self.default_model)
            || self.enabled_models.iter().any(|m| m == model)
    }

    /// Resolve the requested model, or the default when none is requested.
    ///
    /// # Errors
    ///
    /// - `Error::Config` when nothing is requested and no default is set
    /// - `Error::ModelNotEnabled` when the model is not enabled
    /// - `Error::UnknownModel` when no provider serves the model
    /// - `Error::Config` when the model's overrides are out of range
    pub fn resolve(&self, requested: Option<&str>) -> Result<ModelSelection> {
        let model = match requested.filter(|m| !m.is_empty()) {
            Some(model) => model,
            None if self.default_model.is_empty() => {
                return Err(Error::config("no default OCR model configured"));
            }
            None => self.default_model.as_str(),
        };

        if !self.is_enabled(model) {
            return Err(Error::ModelNotEnabled(model.to_string()));
        }
        let kind =
            ProviderKind::for_model(model).ok_or_else(|| Error::UnknownModel(model.to_string()))?;

        let overrides = self.model_configs.get(model).cloned().unwrap_or_default();
        let options = CallOptions {
            model: Some(model.to_string()),
            max_tokens: overrides.max_tokens,
            temperature: overrides.temperature,
        };
        options.validate(kind)?;
        Ok(ModelSelection { kind, options })
    }

    fn keep_default_enabled(&mut self) {
        if !self.default_model.is_empty() && !self.enabled_models.contains(&self.default_model) {
            self.enabled_models.push(self.default_model.clone());
        }
    }
}
