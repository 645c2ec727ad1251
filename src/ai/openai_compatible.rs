use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{AiError, ChatRequest, ChatResponse, LlmClient};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: WireContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Parts(Vec<WirePart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for providers exposing an OpenAI-style `/chat/completions` route
/// (DeepSeek, Mistral).
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: Client,
    provider: &'static str,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(
        http: Client,
        provider: &'static str,
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    fn build_request<'a>(&'a self, request: &'a ChatRequest) -> CompletionRequest<'a> {
        let image_at = request.image_target();
        let messages = request
            .messages
            .iter()
            .enumerate()
            .map(|(idx, m)| {
                let content = match (&request.image, image_at == Some(idx)) {
                    (Some(image), true) => WireContent::Parts(vec![
                        WirePart::Text { text: &m.content },
                        WirePart::ImageUrl {
                            image_url: ImageUrl {
                                url: image.data_url(),
                            },
                        },
                    ]),
                    _ => WireContent::Text(&m.content),
                };
                WireMessage {
                    role: m.role.as_str(),
                    content,
                }
            })
            .collect();

        CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request
                .json_output
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }

    fn error_message(body: &str) -> Option<String> {
        let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
        envelope.error.map(|e| e.message).or(envelope.message)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn provider(&self) -> &'static str {
        self.provider
    }

    #[instrument(skip(self, request), fields(provider = self.provider, model = %self.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AiError::NotConfigured(self.provider))?;
        let url = format!("{}/chat/completions", self.base_url);

        debug!(messages = request.messages.len(), image = request.image.is_some(), "chat completion request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_request(request))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = Self::error_message(&text).unwrap_or_else(|| status.to_string());
            error!(%status, %message, "chat completion api error");
            return Err(AiError::Api {
                provider: self.provider,
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| AiError::Parse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AiError::EmptyResponse)?;

        Ok(ChatResponse {
            content,
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}
