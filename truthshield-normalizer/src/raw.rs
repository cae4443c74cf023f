use crate::error::NormalizeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text of a chat completion plus the optional parallel citation list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLlmResponse {
    pub message_text: String,
    /// Position `i` (0-based) is implied to back marker `[i + 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
}

impl RawLlmResponse {
    pub fn new(message_text: impl Into<String>, citations: Option<Vec<String>>) -> Self {
        Self {
            message_text: message_text.into(),
            citations,
        }
    }

    /// Pull `choices[0].message.content` and `citations` out of a
    /// chat-completion response.
    ///
    /// ```
    /// use serde_json::json;
    /// use truthshield_normalizer::RawLlmResponse;
    ///
    /// let value = json!({
    ///     "choices": [{ "message": { "content": "[VERDICT] True" } }],
    ///     "citations": ["https://example.com/a"]
    /// });
    /// let raw = RawLlmResponse::from_value(&value).unwrap();
    /// assert_eq!(raw.message_text, "[VERDICT] True");
    /// assert_eq!(raw.citations.unwrap().len(), 1);
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, NormalizeError> {
        let object = match value {
            Value::Object(object) => object,
            Value::String(text) if looks_like_html(text) => {
                return Err(NormalizeError::HtmlBody { body: text.clone() });
            }
            other => {
                return Err(NormalizeError::Schema {
                    reason: format!("expected a JSON object, got {}", json_kind(other)),
                    dump: dump(other),
                });
            }
        };

        let content = object
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| NormalizeError::Schema {
                reason: "missing choices[0].message.content".to_string(),
                dump: dump(value),
            })?;

        let citations = object
            .get("citations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            });

        Ok(Self::new(content, citations))
    }
}

/// Proxies and misconfigured gateways answer with an HTML error page.
pub fn looks_like_html(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    lowered.contains("<!doctype") || lowered.contains("<html")
}

/// Stricter than [`looks_like_html`]: the text must *start* as an HTML
/// document, so prose that merely mentions a `<html>` tag is left alone.
pub fn is_html_page(text: &str) -> bool {
    let head: String = text.trim_start().chars().take(9).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn dump(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn html_string_is_a_transport_failure() {
        let err = RawLlmResponse::from_value(&json!("<!DOCTYPE html><html></html>")).unwrap_err();
        assert!(matches!(err, NormalizeError::HtmlBody { .. }));
    }

    #[test]
    fn plain_string_is_a_schema_failure() {
        let err = RawLlmResponse::from_value(&json!("just text")).unwrap_err();
        match err {
            NormalizeError::Schema { reason, dump } => {
                assert!(reason.contains("a string"));
                assert_eq!(dump, "just text");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_content_is_a_schema_failure() {
        for value in [
            json!({}),
            json!({ "choices": [] }),
            json!({ "choices": [{ "message": {} }] }),
            json!({ "choices": [{ "message": { "content": 42 } }] }),
            json!([1, 2, 3]),
            json!(null),
        ] {
            let err = RawLlmResponse::from_value(&value).unwrap_err();
            assert!(matches!(err, NormalizeError::Schema { .. }), "value: {value}");
        }
    }

    #[test]
    fn non_string_citations_are_skipped() {
        let value = json!({
            "choices": [{ "message": { "content": "text" } }],
            "citations": ["https://a.example", 7, null, "https://b.example"]
        });
        let raw = RawLlmResponse::from_value(&value).unwrap();
        assert_eq!(
            raw.citations,
            Some(vec!["https://a.example".to_string(), "https://b.example".to_string()])
        );
    }

    #[test]
    fn absent_citations_stay_absent() {
        let value = json!({ "choices": [{ "message": { "content": "text" } }] });
        assert_eq!(RawLlmResponse::from_value(&value).unwrap().citations, None);
    }
}
