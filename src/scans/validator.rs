use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::{
    ai::{extract_json, AiError, ChatMessage, ChatRequest, InlineImage, LlmClient},
    nutrition::fusion::{Detection, DetectionSource},
};

#[derive(Debug, Deserialize)]
struct ValidationReply {
    #[serde(default)]
    validated_foods: Vec<ValidatedFood>,
}

#[derive(Debug, Deserialize)]
struct ValidatedFood {
    name: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    notes: Option<String>,
}

/// Second pass of the scan pipeline: a vision model confirms the detector's
/// foods and adds any it missed.
pub struct FoodValidator {
    llm: Arc<dyn LlmClient>,
    threshold: f64,
}

impl FoodValidator {
    pub fn new(llm: Arc<dyn LlmClient>, threshold: f64) -> Self {
        Self { llm, threshold }
    }

    /// Never fails: any model or parse error yields an empty list so the scan
    /// can continue on detector output alone.
    #[instrument(skip(self, image, detections), fields(provider = self.llm.provider(), detected = detections.len()))]
    pub async fn validate(&self, image: &InlineImage, detections: &[Detection]) -> Vec<Detection> {
        let request = ChatRequest::new(vec![ChatMessage::user(validation_prompt(detections))])
            .with_image(image.clone())
            .with_max_tokens(1000)
            .with_temperature(0.1)
            .expect_json();

        let reply = match self.llm.complete(&request).await {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "food validation request failed");
                return Vec::new();
            }
        };
        match parse_validation(&reply.content, self.threshold) {
            Ok(foods) => {
                info!(validated = foods.len(), "food validation complete");
                foods
            }
            Err(e) => {
                error!(error = %e, "food validation reply unusable");
                Vec::new()
            }
        }
    }
}

pub fn validation_prompt(detections: &[Detection]) -> String {
    let detected = if detections.is_empty() {
        "none".to_string()
    } else {
        detections
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        r#"You are a precise food detection system. Analyze this image and the provided detections.

DETECTED: {detected}

TASK:
1. Validate each detection - confirm if the food is actually visible
2. Identify any additional visible food items that were missed
3. Return ONLY foods you can clearly see in the image

STRICT RULES:
- NO hallucinations: only report foods clearly visible
- Provide a confidence score 0.0-1.0 for each item
- Use lowercase names (e.g., "rice", "chicken", "beans")
- If a detection is wrong, exclude it
- For additional foods, confidence must be >= 0.3

OUTPUT FORMAT (valid JSON only):
{{
  "validated_foods": [
    {{"name": "rice", "confidence": 0.85, "notes": "confirmed present"}},
    {{"name": "beans", "confidence": 0.72, "notes": "additional item found"}}
  ]
}}

Return JSON only, no other text."#
    )
}

pub fn parse_validation(text: &str, threshold: f64) -> Result<Vec<Detection>, AiError> {
    let reply: ValidationReply = extract_json(text)?;
    Ok(reply
        .validated_foods
        .into_iter()
        .filter(|f| f.confidence >= threshold && !f.name.trim().is_empty())
        .map(|f| Detection {
            name: f.name.trim().to_lowercase(),
            confidence: f.confidence.min(1.0),
            source: DetectionSource::Validator,
            notes: f.notes,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::scripted::ScriptedLlm;

    #[test]
    fn prompt_lists_detections() {
        let prompt = validation_prompt(&[
            Detection::new("rice", 0.4, DetectionSource::Detector),
            Detection::new("beans", 0.4, DetectionSource::Detector),
        ]);
        assert!(prompt.contains("DETECTED: rice, beans"));
        assert!(prompt.contains("\"validated_foods\""));
        assert!(validation_prompt(&[]).contains("DETECTED: none"));
    }

    #[test]
    fn parse_filters_by_threshold() {
        let text = r#"```json
{"validated_foods": [
  {"name": "Rice", "confidence": 0.85, "notes": "confirmed"},
  {"name": "beans", "confidence": 0.2}
]}
```"#;
        let foods = parse_validation(text, 0.3).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "rice");
        assert_eq!(foods[0].source, DetectionSource::Validator);
        assert_eq!(foods[0].notes.as_deref(), Some("confirmed"));
    }

    #[test]
    fn parse_errors_on_prose() {
        assert!(parse_validation("I think there is rice", 0.3).is_err());
    }

    #[tokio::test]
    async fn failures_become_empty_lists() {
        let image = InlineImage::from_bytes(b"img", "image/png");
        let failing = FoodValidator::new(Arc::new(ScriptedLlm::failing()), 0.3);
        assert!(failing.validate(&image, &[]).await.is_empty());

        let garbage = FoodValidator::new(Arc::new(ScriptedLlm::replying("no idea")), 0.3);
        assert!(garbage.validate(&image, &[]).await.is_empty());
    }

    #[tokio::test]
    async fn validate_requests_json_with_image() {
        let llm = Arc::new(ScriptedLlm::replying(
            r#"{"validated_foods":[{"name":"okra soup","confidence":0.9}]}"#,
        ));
        let validator = FoodValidator::new(llm.clone(), 0.3);
        let image = InlineImage::from_bytes(b"img", "image/png");
        let foods = validator.validate(&image, &[]).await;
        assert_eq!(foods[0].name, "okra soup");

        let sent = llm.recorded();
        assert!(sent[0].json_output);
        assert!(sent[0].image.is_some());
    }
}
