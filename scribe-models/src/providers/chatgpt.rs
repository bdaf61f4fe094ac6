//! OpenAI Chat Completions provider.
//!
//! The image travels as a `data:` URL inside an `image_url` content part with
//! the `high` detail hint; the system instruction is a leading system message.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::OcrProvider;
use super::state::{ProviderState, VendorClient, secret_header};
use crate::types::CallParams;
use crate::{CallOptions, ProviderConfig, ProviderKind, ProviderResponse, Result, Usage};

const NAME: &str = "ChatGPT";

/// OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Model used when neither config nor call picks one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Models offered for OCR.
pub const SUPPORTED_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4-turbo-preview",
    "gpt-4-vision-preview",
    "gpt-4",
];

// ────────────────────────────────────────────────────────────────────────────
// Chat Completions API types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

impl From<ChatResponse> for ProviderResponse {
    fn from(response: ChatResponse) -> Self {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Self {
            content,
            usage: response.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        }
    }
}

fn build_request<'a>(
    params: &'a CallParams,
    image_base64: &str,
    prompt: &'a str,
    system_prompt: Option<&'a str>,
) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt {
        messages.push(ChatMessage {
            role: "system",
            content: MessageContent::Text(system),
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: MessageContent::Parts(vec![
            ContentPart::Text { text: prompt },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:image/png;base64,{image_base64}"),
                    detail: "high",
                },
            },
        ]),
    });

    ChatRequest {
        model: &params.model,
        messages,
        max_tokens: params.max_tokens,
        temperature: params.temperature,
        response_format: ResponseFormat { kind: "text" },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ChatGptProvider
// ────────────────────────────────────────────────────────────────────────────

/// OCR through OpenAI's GPT-4 family.
pub struct ChatGptProvider {
    state: ProviderState<VendorClient>,
}

impl ChatGptProvider {
    pub fn new() -> Self {
        Self {
            state: ProviderState::new(NAME),
        }
    }
}

impl Default for ChatGptProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrProvider for ChatGptProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::ChatGpt
    }

    fn initialize(&mut self, config: ProviderConfig) -> Result<()> {
        config.validate(self.kind())?;
        let bearer = secret_header(&format!("Bearer {}", config.api_key.expose_secret().trim()))?;
        let client = VendorClient::new(
            NAME,
            config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            [(AUTHORIZATION, bearer)],
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
        let response: ChatResponse = session
            .client
            .post_json("/v1/chat/completions", &request)
            .await?;
        Ok(response.into())
    }
}
