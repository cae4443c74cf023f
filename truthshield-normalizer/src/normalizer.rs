use crate::error::NormalizeError;
use crate::explanation::extract_explanation;
use crate::raw::{is_html_page, looks_like_html, RawLlmResponse};
use crate::record::FactCheckRecord;
use crate::signals::{propaganda_indicators, source_balance};
use crate::sources::{citation_markers, extract_sources, ExtractedSources};
use crate::verdict::extract_verdict;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};
use truthshield_common::NormalizerSettings;

/// Turns chat-completion output into a [`FactCheckRecord`].
///
/// Every entry point returns a record. Transport, schema and parse failures
/// come back as degraded records with `verdict = False`, no sources and a
/// `failure` tag.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    settings: NormalizerSettings,
}

impl Normalizer {
    pub fn new(settings: NormalizerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &NormalizerSettings {
        &self.settings
    }

    /// Normalize message text plus optional citations. Message text that is
    /// itself an HTML page is a transport failure, not prose.
    pub fn normalize(&self, raw: &RawLlmResponse) -> FactCheckRecord {
        let text = raw.message_text.as_str();
        if is_html_page(text) {
            return self.degrade(NormalizeError::HtmlBody {
                body: text.to_string(),
            });
        }
        let citations = raw.citations.as_deref();
        match guarded(text, || self.parse(text, citations)) {
            Ok(record) => record,
            Err(err) => self.degrade(err),
        }
    }

    /// Normalize an already-deserialized response value.
    pub fn normalize_value(&self, value: &Value) -> FactCheckRecord {
        match RawLlmResponse::from_value(value) {
            Ok(raw) => self.normalize(&raw),
            Err(err) => self.degrade(err),
        }
    }

    /// Normalize a response body exactly as it came off the wire.
    pub fn normalize_body(&self, body: &str) -> FactCheckRecord {
        if looks_like_html(body) {
            return self.degrade(NormalizeError::HtmlBody {
                body: body.to_string(),
            });
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => self.normalize_value(&value),
            Err(err) => self.degrade(NormalizeError::NonJsonBody {
                reason: err.to_string(),
                body: body.to_string(),
            }),
        }
    }

    fn parse(&self, text: &str, citations: Option<&[String]>) -> FactCheckRecord {
        let verdict = extract_verdict(text);
        let explanation = extract_explanation(text, self.settings.min_explanation_chars);
        let ExtractedSources {
            sources,
            source_refs,
        } = extract_sources(text, citations);

        let dangling: Vec<u32> = citation_markers(&explanation)
            .into_iter()
            .filter(|n| !source_refs.contains_key(n))
            .collect();
        if !dangling.is_empty() {
            debug!(?dangling, "normalizer.citations.dangling");
        }

        let propaganda = propaganda_indicators(text, &self.settings.propaganda_terms);
        let balance = source_balance(&sources, &self.settings.international_tlds);

        debug!(
            ?verdict,
            sources = sources.len(),
            refs = source_refs.len(),
            citations = citations.map_or(0, <[String]>::len),
            "normalizer.parsed"
        );

        FactCheckRecord {
            verdict,
            explanation,
            sources,
            source_refs,
            propaganda_indicators: propaganda,
            source_balance: balance,
            full_response: text.to_string(),
            failure: None,
        }
    }

    fn degrade(&self, err: NormalizeError) -> FactCheckRecord {
        let kind = err.kind();
        warn!(failure = ?kind, error = %err, "normalizer.degraded");

        let explanation = err.explanation();
        let full_response = match err {
            NormalizeError::HtmlBody { body } | NormalizeError::NonJsonBody { body, .. } => {
                truncate_chars(&body, self.settings.html_snippet_chars)
            }
            NormalizeError::Schema { dump, .. } => {
                truncate_chars(&dump, self.settings.schema_dump_chars)
            }
            NormalizeError::Parse { text, .. } => text,
        };
        FactCheckRecord::degraded(kind, explanation, full_response)
    }
}

/// Normalize with default settings.
///
/// ```
/// use truthshield_normalizer::{normalize, RawLlmResponse, Verdict};
///
/// let raw = RawLlmResponse::new("[VERDICT] Partially true\n[EXPLANATION] The figure is from 2019.", None);
/// assert_eq!(normalize(&raw).verdict, Verdict::PartiallyTrue);
/// ```
pub fn normalize(raw: &RawLlmResponse) -> FactCheckRecord {
    Normalizer::default().normalize(raw)
}

/// Runs `f`, turning a panic into [`NormalizeError::Parse`].
fn guarded<F>(text: &str, f: F) -> Result<FactCheckRecord, NormalizeError>
where
    F: FnOnce() -> FactCheckRecord,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| NormalizeError::Parse {
        message: panic_message(payload.as_ref()),
        text: text.to_string(),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// At most `max` characters, never splitting a code point.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FailureKind, Verdict};
    use serde_json::json;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn panic_becomes_parse_failure() {
        let err = guarded("partial text", || panic!("boom")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);

        let record = Normalizer::default().degrade(err);
        assert_eq!(record.verdict, Verdict::False);
        assert!(record.explanation.contains("boom"));
        assert_eq!(record.full_response, "partial text");
        assert_eq!(record.failure, Some(FailureKind::Parse));
    }

    #[test]
    fn html_snippet_is_capped() {
        let body = format!("<!DOCTYPE html><html>{}</html>", "x".repeat(2_000));
        let record = Normalizer::default().normalize_body(&body);
        assert_eq!(record.failure, Some(FailureKind::TransportFormat));
        assert_eq!(record.full_response.chars().count(), 500);
    }

    #[test]
    fn html_message_text_is_a_transport_failure() {
        let raw = RawLlmResponse::new(
            "  <!DOCTYPE html><html><body>502 Bad Gateway</body></html>",
            Some(vec!["https://example.org".to_string()]),
        );
        let record = Normalizer::default().normalize(&raw);
        assert_eq!(record.failure, Some(FailureKind::TransportFormat));
        assert!(record.sources.is_empty());
        assert!(record.full_response.contains("502 Bad Gateway"));

        let prose = RawLlmResponse::new(
            "[VERDICT] True\n[EXPLANATION] The page does start with an <html> element.",
            None,
        );
        let record = Normalizer::default().normalize(&prose);
        assert!(!record.is_degraded());
        assert_eq!(record.verdict, Verdict::True);
    }

    #[test]
    fn schema_dump_is_capped() {
        let value = json!({ "unexpected": "y".repeat(1_000) });
        let record = Normalizer::default().normalize_value(&value);
        assert_eq!(record.failure, Some(FailureKind::Schema));
        assert_eq!(record.full_response.chars().count(), 200);
    }

    #[test]
    fn custom_limits_apply() {
        let settings = NormalizerSettings {
            html_snippet_chars: 10,
            ..NormalizerSettings::default()
        };
        let record = Normalizer::new(settings).normalize_body("<html><body>gateway timeout</body></html>");
        assert_eq!(record.full_response, "<html><bod");
    }

    #[test]
    fn garbage_body_is_a_transport_failure() {
        let record = Normalizer::default().normalize_body("upstream connect error");
        assert_eq!(record.failure, Some(FailureKind::TransportFormat));
        assert_eq!(record.full_response, "upstream connect error");
        assert!(record.sources.is_empty());
    }

    #[test]
    fn body_with_valid_shape_is_parsed() {
        let body = json!({
            "choices": [{ "message": { "content": "[VERDICT] True\n[EXPLANATION] The bridge opened in 1937 as reported [1].\n[SOURCES]\n[1] - Archive" } }],
            "citations": ["https://archive.example.org/bridge"]
        })
        .to_string();
        let record = Normalizer::default().normalize_body(&body);
        assert!(!record.is_degraded());
        assert_eq!(record.verdict, Verdict::True);
        assert_eq!(
            record.resolve_citation(1).map(|r| r.url.as_str()),
            Some("https://archive.example.org/bridge")
        );
    }
}
