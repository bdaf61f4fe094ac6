//! Display metadata for the models the providers advertise.

use crate::{AvailableModel, ProviderKind};

/// `(model id, display name, description)`.
const MODEL_CATALOG: &[(&str, &str, &str)] = &[
    (
        "claude-3-5-sonnet-20241022",
        "Claude 3.5 Sonnet",
        "Latest Claude model with enhanced capabilities",
    ),
    (
        "claude-3-5-haiku-20241022",
        "Claude 3.5 Haiku",
        "Fast, low-cost Claude model",
    ),
    (
        "claude-3-opus-20240229",
        "Claude 3 Opus",
        "Most capable Claude 3 model for complex documents",
    ),
    (
        "claude-3-sonnet-20240229",
        "Claude 3 Sonnet",
        "Balanced Claude 3 model",
    ),
    (
        "claude-3-haiku-20240307",
        "Claude 3 Haiku",
        "Fastest Claude 3 model",
    ),
    (
        "claude-4-sonnet-20250514",
        "Claude 4 Sonnet",
        "Claude 4 generation with improved vision",
    ),
    ("gpt-4o", "GPT-4o", "OpenAI multimodal flagship model"),
    ("gpt-4o-mini", "GPT-4o Mini", "Fast, affordable GPT-4o variant"),
    ("gpt-4-turbo", "GPT-4 Turbo", "GPT-4 Turbo with vision"),
    (
        "gpt-4-turbo-preview",
        "GPT-4 Turbo Preview",
        "Preview release of GPT-4 Turbo",
    ),
    (
        "gpt-4-vision-preview",
        "GPT-4 Vision Preview",
        "Original GPT-4 vision preview",
    ),
    ("gpt-4", "GPT-4", "Original GPT-4 model"),
    (
        "gemini-2.0-flash-exp",
        "Gemini 2.0 Flash (Experimental)",
        "Next-generation multimodal Gemini model",
    ),
    (
        "gemini-1.5-flash",
        "Gemini 1.5 Flash",
        "Fast multimodal Gemini model",
    ),
    (
        "gemini-1.5-flash-8b",
        "Gemini 1.5 Flash-8B",
        "Smallest, lowest-latency Gemini 1.5 model",
    ),
    (
        "gemini-1.5-pro",
        "Gemini 1.5 Pro",
        "Long-context Gemini model for large documents",
    ),
    (
        "gemini-pro-vision",
        "Gemini Pro Vision",
        "First-generation Gemini vision model",
    ),
];

/// Describe a model for selection UIs.
///
/// Models missing from the catalog use their identifier as display name.
pub fn describe(provider: ProviderKind, model: &str) -> AvailableModel {
    let entry = MODEL_CATALOG.iter().find(|(id, _, _)| *id == model);
    AvailableModel {
        model: model.to_string(),
        display_name: entry.map_or(model, |&(_, name, _)| name).to_string(),
        provider,
        description: entry.map(|&(_, _, description)| description.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_model_has_catalog_entry() {
        for kind in ProviderKind::ALL {
            for model in kind.supported_models() {
                let described = describe(kind, model);
                assert_ne!(described.display_name, *model, "missing entry for {model}");
                assert!(described.description.is_some());
            }
        }
    }

    #[test]
    fn unknown_model_falls_back_to_id() {
        let described = describe(ProviderKind::Claude, "claude-next");
        assert_eq!(described.display_name, "claude-next");
        assert_eq!(described.provider, ProviderKind::Claude);
        assert!(described.description.is_none());
    }
}
