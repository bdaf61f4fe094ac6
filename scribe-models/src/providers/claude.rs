//! Anthropic Messages API provider.
//!
//! The image goes in as a base64 `image` block ahead of the prompt, and the
//! system instruction uses the dedicated top-level `system` field.

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::OcrProvider;
use super::state::{ProviderState, VendorClient, secret_header};
use crate::types::CallParams;
use crate::{CallOptions, ProviderConfig, ProviderKind, ProviderResponse, Result, Usage};

const NAME: &str = "Claude";
const API_VERSION: &str = "2023-06-01";

/// Anthropic API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Model used when neither config nor call picks one.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Models offered for OCR.
pub const SUPPORTED_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
    "claude-4-sonnet-20250514",
];

// ────────────────────────────────────────────────────────────────────────────
// Messages API types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u64,
    output_tokens: u64,
}

impl From<MessagesResponse> for ProviderResponse {
    fn from(response: MessagesResponse) -> Self {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Self {
            content,
            usage: response
                .usage
                .map(|u| Usage::new(u.input_tokens, u.output_tokens)),
        }
    }
}

fn build_request<'a>(
    params: &'a CallParams,
    image_base64: &'a str,
    prompt: &'a str,
    system_prompt: Option<&'a str>,
) -> MessagesRequest<'a> {
    MessagesRequest {
        model: &params.model,
        max_tokens: params.max_tokens,
        temperature: params.temperature,
        system: system_prompt,
        messages: vec![Message {
            role: "user",
            content: vec![
                ContentBlock::Image {
                    source: ImageSource {
                        kind: "base64",
                        media_type: "image/png",
                        data: image_base64,
                    },
                },
                ContentBlock::Text { text: prompt },
            ],
        }],
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ClaudeProvider
// ────────────────────────────────────────────────────────────────────────────

/// OCR through Anthropic's Claude models.
pub struct ClaudeProvider {
    state: ProviderState<VendorClient>,
}

impl ClaudeProvider {
    pub fn new() -> Self {
        Self {
            state: ProviderState::new(NAME),
        }
    }
}

impl Default for ClaudeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrProvider for ClaudeProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn initialize(&mut self, config: ProviderConfig) -> Result<()> {
        config.validate(self.kind())?;
        let client = VendorClient::new(
            NAME,
            config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            [
                (
                    HeaderName::from_static("x-api-key"),
                    secret_header(config.api_key.expose_secret())?,
                ),
                (
                    HeaderName::from_static("anthropic-version"),
                    HeaderValue::from_static(API_VERSION),
                ),
            ],
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
        let response: MessagesResponse = session.client.post_json("/v1/messages", &request).await?;
        Ok(response.into())
    }
}
