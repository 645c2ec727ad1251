use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{
    ai::{ChatMessage, ChatRequest, InlineImage, LlmClient},
    nutrition::fusion::{Detection, DetectionSource},
};

/// Minimum confidence a detector result is considered trustworthy at.
pub const DETECTOR_THRESHOLD: f64 = 0.3;

/// Room for a long list of dish names; thinking tokens are budgeted separately.
const DETECTION_MAX_TOKENS: u32 = 512;

const DETECTION_PROMPT: &str = "List every distinct food or drink visible in this photo. \
Reply with a single comma-separated list of short lowercase food names \
(for example: jollof rice, fried plantain, grilled chicken). \
Do not add quantities, explanations or sentences. \
If there is no food in the photo, reply with: none";

/// First pass of the scan pipeline: names the foods in a photo.
#[async_trait]
pub trait FoodDetector: Send + Sync {
    async fn detect(&self, image: &InlineImage) -> anyhow::Result<Vec<Detection>>;
}

/// Detector backed by a vision model answering with a comma-separated list.
pub struct VisionLlmDetector {
    llm: Arc<dyn LlmClient>,
}

impl VisionLlmDetector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FoodDetector for VisionLlmDetector {
    #[instrument(skip(self, image), fields(provider = self.llm.provider()))]
    async fn detect(&self, image: &InlineImage) -> anyhow::Result<Vec<Detection>> {
        let request = ChatRequest::new(vec![ChatMessage::user(DETECTION_PROMPT)])
            .with_image(image.clone())
            .with_max_tokens(DETECTION_MAX_TOKENS)
            .with_temperature(0.0);
        let response = self.llm.complete(&request).await?;
        let detections = parse_food_list(&response.content, DETECTOR_THRESHOLD + 0.1);
        debug!(count = detections.len(), raw = %response.content, "detector output");
        Ok(detections)
    }
}

/// Turns "Rice, the beans, none" into detections, dropping anything that
/// does not look like a short food name.
pub fn parse_food_list(text: &str, confidence: f64) -> Vec<Detection> {
    let mut seen = HashSet::new();
    text.split(|c| c == ',' || c == '\n')
        .map(|raw| {
            let item = raw
                .trim()
                .trim_matches(|c: char| c == '-' || c == '*' || c == '"' || c == '\'')
                .trim()
                .to_lowercase();
            strip_article(&item).to_string()
        })
        .filter(|item| item != "none")
        .filter(|item| item.chars().count() > 2)
        .filter(|item| !item.contains('.'))
        .filter(|item| item.split_whitespace().count() <= 3)
        .filter(|item| seen.insert(item.clone()))
        .map(|name| Detection::new(name, confidence, DetectionSource::Detector))
        .collect()
}

fn strip_article(item: &str) -> &str {
    for article in ["a ", "an ", "the ", "some "] {
        if let Some(rest) = item.strip_prefix(article) {
            return rest.trim_start();
        }
    }
    item
}
