use serde::de::DeserializeOwned;

use super::AiError;

/// Returns the body of the first fenced block (```json or bare ```), or the
/// trimmed input when there is no fence. An unterminated fence runs to the end.
pub fn strip_code_fences(text: &str) -> &str {
    let (start, marker_len) = match (text.find("```json"), text.find("```")) {
        (Some(i), _) => (i, "```json".len()),
        (None, Some(i)) => (i, "```".len()),
        (None, None) => return text.trim(),
    };
    let body = &text[start + marker_len..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|e| AiError::Parse(e.to_string()))
}
