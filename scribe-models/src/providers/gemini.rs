//! Google Gemini `generateContent` provider.
//!
//! Gemini has no separate system slot here: the system instruction is
//! prefixed onto the prompt with a blank line in between.

use async_trait::async_trait;
use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::OcrProvider;
use super::state::{ProviderState, VendorClient, secret_header};
use crate::types::CallParams;
use crate::{
    CallOptions, Error, ProviderConfig, ProviderKind, ProviderResponse, Result, Usage,
};

const NAME: &str = "Gemini";

/// Generative Language API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when neither config nor call picks one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Models offered for OCR.
pub const SUPPORTED_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-1.5-pro",
    "gemini-pro-vision",
];

// ────────────────────────────────────────────────────────────────────────────
// generateContent API types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    InlineData(InlineData<'a>),
    Text(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'static str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u64>,
    #[serde(default)]
    candidates_token_count: Option<u64>,
    #[serde(default)]
    total_token_count: Option<u64>,
}

impl GenerateResponse {
    /// Normalize, failing when the vendor returned no candidate at all.
    fn into_provider_response(self) -> Result<ProviderResponse> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let message = match self.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => format!("response was blocked: {reason}"),
                None => "response contained no candidates".to_string(),
            };
            return Err(Error::provider_call(NAME, message));
        };

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(ProviderResponse {
            content,
            usage: self.usage_metadata.map(|u| Usage {
                prompt_tokens: u.prompt_token_count.unwrap_or(0),
                completion_tokens: u.candidates_token_count.unwrap_or(0),
                total_tokens: u.total_token_count.unwrap_or(0),
            }),
        })
    }
}

fn full_prompt(prompt: &str, system_prompt: Option<&str>) -> String {
    match system_prompt {
        Some(system) => format!("{system}\n\n{prompt}"),
        None => prompt.to_string(),
    }
}

fn build_request<'a>(
    params: &CallParams,
    image_base64: &'a str,
    prompt: &str,
    system_prompt: Option<&str>,
) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::InlineData(InlineData {
                    mime_type: "image/png",
                    data: image_base64,
                }),
                Part::Text(full_prompt(prompt, system_prompt)),
            ],
        }],
        generation_config: GenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_tokens,
        },
    }
}

fn endpoint(model: &str) -> String {
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!("/v1beta/models/{model}:generateContent")
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiProvider
// ────────────────────────────────────────────────────────────────────────────

/// OCR through Google's Gemini models.
pub struct GeminiProvider {
    state: ProviderState<VendorClient>,
}

impl GeminiProvider {
    pub fn new() -> Self {
        Self {
            state: ProviderState::new(NAME),
        }
    }
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrProvider for GeminiProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn initialize(&mut self, config: ProviderConfig) -> Result<()> {
        config.validate(self.kind())?;
        let client = VendorClient::new(
            NAME,
            config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            [(
                HeaderName::from_static("x-goog-api-key"),
                secret_header(config.api_key.expose_secret())?,
            )],
        )?;
        self.state.install(config, client);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.state.is_available()
    }

    fn supported_models(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    async fn process_image_with(
        &self,
        image_base64: &str,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &CallOptions,
    ) -> Result<ProviderResponse> {
        let session = self.state.ready()?;
        let params =
            CallParams::resolve(self.kind(), &session.config, options, DEFAULT_MODEL)?;
        let system_prompt = system_prompt.filter(|s| !s.is_empty());
        let request = build_request(&params, image_base64, prompt, system_prompt);

        debug!(provider = NAME, model = %params.model, "sending OCR request");
        let response: GenerateResponse = session
            .client
            .post_json(&endpoint(&params.model), &request)
            .await?;
        response.into_provider_response()
    }
}
