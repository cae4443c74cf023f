use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tri-state accuracy judgment for a checked claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    True,
    False,
    PartiallyTrue,
}

/// A titled, optionally linked reference backing the explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub title: String,
    /// Empty when the model named a source without a link.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_number: Option<u32>,
}

impl Source {
    pub fn new(title: impl Into<String>, url: impl Into<String>, ref_number: Option<u32>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ref_number,
        }
    }
}

/// Lookup entry for hyperlinking a `[n]` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBalance {
    pub has_multiple_sources: bool,
    pub has_international_sources: bool,
}

/// Which stage rejected the upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// HTML or another non-JSON body arrived instead of a completion.
    TransportFormat,
    /// JSON arrived but without `choices[0].message.content`.
    Schema,
    /// The heuristics themselves failed.
    Parse,
}

/// Structured result of normalizing one LLM response.
///
/// Built once per verification request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckRecord {
    pub verdict: Verdict,
    pub explanation: String,
    pub sources: Vec<Source>,
    pub source_refs: BTreeMap<u32, SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propaganda_indicators: Option<Vec<String>>,
    pub source_balance: SourceBalance,
    pub full_response: String,
    /// Present only on degraded records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl FactCheckRecord {
    /// A renderable record for a response that could not be parsed.
    pub fn degraded(
        kind: FailureKind,
        explanation: impl Into<String>,
        full_response: impl Into<String>,
    ) -> Self {
        Self {
            verdict: Verdict::False,
            explanation: explanation.into(),
            sources: Vec::new(),
            source_refs: BTreeMap::new(),
            propaganda_indicators: None,
            source_balance: SourceBalance::default(),
            full_response: full_response.into(),
            failure: Some(kind),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }

    /// Resolve a citation marker; dangling markers simply yield `None`.
    pub fn resolve_citation(&self, ref_number: u32) -> Option<&SourceRef> {
        self.source_refs.get(&ref_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_for_presentation_layer() {
        let mut refs = BTreeMap::new();
        refs.insert(
            1,
            SourceRef {
                url: "https://example.com/a".into(),
                title: "Example".into(),
            },
        );
        let record = FactCheckRecord {
            verdict: Verdict::PartiallyTrue,
            explanation: "Mostly right [1].".into(),
            sources: vec![Source::new("Example", "https://example.com/a", Some(1))],
            source_refs: refs,
            propaganda_indicators: None,
            source_balance: SourceBalance {
                has_multiple_sources: false,
                has_international_sources: false,
            },
            full_response: "raw".into(),
            failure: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["verdict"], json!("partially_true"));
        assert_eq!(value["sources"][0]["refNumber"], json!(1));
        assert_eq!(value["sourceRefs"]["1"]["url"], json!("https://example.com/a"));
        assert_eq!(value["sourceBalance"]["hasMultipleSources"], json!(false));
        assert!(value.get("propagandaIndicators").is_none());
        assert!(value.get("failure").is_none());
    }

    #[test]
    fn dangling_citation_is_not_an_error() {
        let record = FactCheckRecord::degraded(FailureKind::Schema, "bad", "{}");
        assert!(record.resolve_citation(3).is_none());
        assert!(record.is_degraded());
        assert_eq!(record.verdict, Verdict::False);
    }
}
