//! Hosted generative-model clients.
//!
//! Every feature that talks to a model goes through [`LlmClient`], so handlers
//! never see provider wire formats. Two providers exist:
//!
//! - [`GeminiClient`] for Google's `generateContent` API (image analysis,
//!   meal plans, detection).
//! - [`OpenAiCompatibleClient`] for `chat/completions` style APIs (the health
//!   assistant and the Mistral vision validator).

mod gemini;
mod json;
mod openai_compatible;
#[cfg(test)]
pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use gemini::{GeminiClient, DEFAULT_THINKING_BUDGET};
pub use json::{extract_json, strip_code_fences};
pub use openai_compatible::OpenAiCompatibleClient;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("{0} client is not configured (missing API key)")]
    NotConfigured(&'static str),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} api error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("failed to parse model output: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Base64 image sent inline with the last user message.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data_base64: String,
}

impl InlineImage {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        use base64::Engine as _;
        Self {
            mime_type: mime_type.into(),
            data_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub image: Option<InlineImage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Ask the provider for a bare JSON document when it supports it.
    pub json_output: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Index of the message the inline image is attached to.
    fn image_target(&self) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| m.role == MessageRole::User)
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_attaches_to_last_user_message() {
        let req = ChatRequest::new(vec![
            ChatMessage::system("sys"),
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
        ]);
        assert_eq!(req.image_target(), Some(3));

        let no_user = ChatRequest::new(vec![ChatMessage::system("only system")]);
        assert_eq!(no_user.image_target(), None);
    }

    #[test]
    fn inline_image_builds_data_url() {
        let img = InlineImage::from_bytes(b"abc", "image/png");
        assert_eq!(img.data_base64, "YWJj");
        assert_eq!(img.data_url(), "data:image/png;base64,YWJj");
    }
}
