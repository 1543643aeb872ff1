//! JSON reply extraction.
//!
//! Models often wrap structured replies in markdown fences or surround them
//! with prose. `extract_json_object` digs out the first top-level object.

use serde_json::Value;

use crate::types::{LlmError, LlmResult};

/// Parse a JSON object out of a model reply.
pub fn extract_json_object(text: &str) -> LlmResult<Value> {
    let cleaned = strip_code_fence(text.trim());

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(cleaned) {
        return Ok(value);
    }

    let start = cleaned.find('{');
    let end = cleaned.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let candidate = &cleaned[s..=e];
            match serde_json::from_str::<Value>(candidate) {
                Ok(value @ Value::Object(_)) => Ok(value),
                Ok(_) => Err(not_an_object()),
                Err(err) => Err(LlmError::ParseError {
                    message: format!("reply is not valid JSON: {}", err),
                }),
            }
        }
        _ => Err(not_an_object()),
    }
}

fn not_an_object() -> LlmError {
    LlmError::ParseError {
        message: "reply does not contain a JSON object".to_string(),
    }
}

/// Remove a surrounding ``` / ```json fence if present.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
