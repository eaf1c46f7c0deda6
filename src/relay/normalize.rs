//! Webhook reply normalization
//!
//! Webhooks answer with anything from plain text to JSON objects wrapping the
//! answer in one of several conventional fields. This module turns the raw
//! body into the display string the chat shows.

use serde_json::Value;

/// Fields probed for the answer, highest priority first
pub const ANSWER_FIELDS: [&str; 5] = ["response", "message", "output", "text", "answer"];

/// Escape sequences unescaped after extraction. Backslash must stay last.
const ESCAPES: [(&str, &str); 4] = [("\\n", "\n"), ("\\t", "\t"), ("\\\"", "\""), ("\\\\", "\\")];

/// Normalize a non-blank webhook body into the display string
pub fn normalize_reply(raw: &str) -> String {
    match extract_answer(raw) {
        Answer::Text(text) => clean_text(&text),
        Answer::Structured(value) => value.to_string(),
    }
}

/// Value picked out of a reply body
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Text(String),
    /// Non-string JSON value found in an answer field
    Structured(Value),
}

/// Pick the answer out of the body without any text cleanup
pub fn extract_answer(raw: &str) -> Answer {
    let trimmed = raw.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return Answer::Text(raw.to_string());
    }

    let Ok(data) = serde_json::from_str::<Value>(raw) else {
        tracing::debug!("Reply looks like JSON but does not parse, using raw text");
        return Answer::Text(raw.to_string());
    };

    match ANSWER_FIELDS
        .iter()
        .filter_map(|field| data.get(*field))
        .find(|value| is_truthy(value))
    {
        Some(Value::String(s)) => Answer::Text(s.clone()),
        Some(other) => Answer::Structured(other.clone()),
        None => Answer::Text(raw.to_string()),
    }
}

/// JavaScript truthiness, which decides whether a probed field counts as present
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strip one pair of enclosing quotes, then unescape literal escape sequences
pub fn clean_text(text: &str) -> String {
    let unquoted = if text.len() > 2 {
        text.strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(text)
    } else {
        text
    };

    ESCAPES
        .iter()
        .fold(unquoted.to_string(), |acc, (from, to)| acc.replace(from, to))
}
