use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{AiError, ChatRequest, ChatResponse, LlmClient, MessageRole};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROVIDER: &str = "gemini";
/// Reasoning tokens allowed on top of a request's answer budget. 2.5 models
/// count thinking against `maxOutputTokens`.
pub const DEFAULT_THINKING_BUDGET: u32 = 1024;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    thinking_budget: u32,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            api_key,
            model: model.into(),
            base_url: API_BASE_URL.into(),
            thinking_budget: DEFAULT_THINKING_BUDGET,
        }
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = budget;
        self
    }

    /// `max_tokens` on the request bounds the visible answer; the thinking
    /// budget is pinned and added on top so reasoning cannot starve the text.
    fn generation_config(&self, request: &ChatRequest) -> GenerationConfig {
        let (max_output_tokens, thinking_config) = match request.max_tokens {
            Some(answer) => (
                Some(answer + self.thinking_budget),
                Some(ThinkingConfig {
                    thinking_budget: self.thinking_budget,
                }),
            ),
            None => (None, None),
        };
        GenerationConfig {
            temperature: request.temperature,
            max_output_tokens,
            response_mime_type: request.json_output.then_some("application/json"),
            thinking_config,
        }
    }

    fn build_request(&self, request: &ChatRequest) -> GenerateRequest {
        let image_at = request.image_target();
        let mut contents = Vec::with_capacity(request.messages.len());
        let mut system_parts = Vec::new();

        for (idx, message) in request.messages.iter().enumerate() {
            if message.role == MessageRole::System {
                system_parts.push(Part::Text {
                    text: message.content.clone(),
                });
                continue;
            }
            let mut parts = vec![Part::Text {
                text: message.content.clone(),
            }];
            if image_at == Some(idx) {
                if let Some(image) = &request.image {
                    parts.push(Part::InlineData {
                        inline_data: Blob {
                            mime_type: image.mime_type.clone(),
                            data: image.data_base64.clone(),
                        },
                    });
                }
            }
            let role = match message.role {
                MessageRole::Assistant => "model",
                _ => "user",
            };
            contents.push(Content {
                role: Some(role.into()),
                parts,
            });
        }

        GenerateRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            generation_config: self.generation_config(request),
        }
    }

    fn extract_text(response: GenerateResponse) -> Result<String, AiError> {
        let text: String = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| match p {
                        Part::Text { text } => Some(text),
                        Part::InlineData { .. } => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AiError::NotConfigured(PROVIDER))?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = self.build_request(request);

        debug!(messages = request.messages.len(), image = request.image.is_some(), "gemini request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            error!(%status, error = %e, "unparseable gemini response");
            AiError::Parse(e.to_string())
        })?;

        if !status.is_success() || parsed.error.is_some() {
            let message = parsed
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            error!(%status, %message, "gemini api error");
            return Err(AiError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message,
            });
        }

        Ok(ChatResponse {
            content: Self::extract_text(parsed)?,
            model: self.model.clone(),
        })
    }
}
