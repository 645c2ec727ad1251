use std::sync::Mutex;

use async_trait::async_trait;

use super::{AiError, ChatRequest, ChatResponse, LlmClient};

type Responder = Box<dyn Fn(&ChatRequest) -> Result<String, AiError> + Send + Sync>;

/// In-process model for tests: answers with a closure and records requests.
pub struct ScriptedLlm {
    responder: Responder,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, AiError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| Err(AiError::NotConfigured("scripted")))
    }

    pub fn recorded(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AiError> {
        self.requests.lock().unwrap().push(request.clone());
        let content = (self.responder)(request)?;
        Ok(ChatResponse {
            content,
            model: "scripted".into(),
        })
    }
}
