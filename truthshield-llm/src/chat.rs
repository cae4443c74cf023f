use crate::traits::{ChatClient, ChatMessage, ChatRequest, LlmError};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use truthshield_common::Result;
use truthshield_http::{Auth, HttpClient, RequestOpts};
use truthshield_normalizer::RawLlmResponse;

pub const PERPLEXITY_API_BASE: &str = "https://api.perplexity.ai/";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

/// Client for any OpenAI-compatible `chat/completions` endpoint.
///
/// The search-augmented verifier and the claim preprocessor both speak this
/// protocol; they differ only in endpoint, model and key.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: HttpClient,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl ChatCompletionsClient {
    pub fn new(endpoint: &str, api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config(format!("missing API key for model {model}")).into());
        }
        let client = HttpClient::new(endpoint).map_err(LlmError::from)?;
        Ok(Self {
            client,
            api_key,
            model,
            temperature: None,
            max_tokens: None,
        })
    }

    /// Search-augmented verifier on Perplexity.
    pub fn perplexity(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new(PERPLEXITY_API_BASE, api_key, model)
    }

    /// Claim preprocessor on OpenAI.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new(OPENAI_API_BASE, api_key, model)
    }

    /// Sampling defaults applied when a request leaves them unset.
    pub fn with_defaults(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.client = self.client.with_retries(retries);
        self
    }
}

#[async_trait]
impl ChatClient for ChatCompletionsClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature.or(self.temperature),
            max_tokens: request.max_tokens.or(self.max_tokens),
        };
        let opts = RequestOpts {
            auth: Some(Auth::Bearer(&self.api_key)),
            ..Default::default()
        };

        tracing::debug!(
            model = %self.model,
            endpoint = %self.client.base(),
            messages = request.messages.len(),
            "llm.chat.request"
        );

        let raw = self
            .client
            .post_json_text("chat/completions", &body, opts)
            .await
            .map_err(LlmError::from)?;

        tracing::debug!(model = %self.model, body_len = raw.len(), "llm.chat.response");
        Ok(raw)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// `choices[0].message.content` of a raw chat-completion body, if the body
/// has that shape.
pub fn message_content(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    RawLlmResponse::from_value(&value)
        .ok()
        .map(|raw| raw.message_text)
}
