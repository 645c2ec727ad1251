use serde::Deserialize;

/// Longest message the assistant will accept.
pub const MAX_CONTENT_CHARS: usize = 4000;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FoodAnalysisRequest {
    pub prompt: String,
    /// Whatever the scan endpoint returned; passed to the model verbatim.
    pub scan_output: serde_json::Value,
    pub image_url: Option<String>,
}

pub fn validate_content(field: &str, text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if text.chars().count() > MAX_CONTENT_CHARS {
        return Err(format!("{field} is longer than {MAX_CONTENT_CHARS} characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_rules() {
        assert!(validate_content("content", "How much fufu can I eat?").is_ok());
        assert_eq!(validate_content("content", "   ").unwrap_err(), "content is required");
        assert!(validate_content("prompt", &"a".repeat(MAX_CONTENT_CHARS + 1)).is_err());
    }
}
