use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use truthshield_common::{Result, TruthShieldError};
use truthshield_http::HttpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One chat-completion call. Unset sampling knobs fall back to the client's
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(system: Option<&str>, user: impl Into<String>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: Role::System,
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: Role::User,
            content: user.into(),
        });
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Content of the last user message.
    pub fn user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LlmError> for TruthShieldError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Http(e) => TruthShieldError::Upstream(e.to_string()),
            LlmError::Config(msg) => TruthShieldError::Config(msg),
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run a chat completion and return the response body exactly as received.
    ///
    /// Only failures to obtain a successful response are errors. Whatever
    /// the service sends back, HTML included, is for the caller to interpret.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Check if the service answers at all.
    async fn health_check(&self) -> Result<bool> {
        let probe = ChatRequest::new(None, "Respond with just 'OK'")
            .with_max_tokens(5)
            .with_temperature(0.0);
        match self.complete(&probe).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(model = self.model_name(), error = %e, "llm.health_check.failed");
                Ok(false)
            }
        }
    }
}
