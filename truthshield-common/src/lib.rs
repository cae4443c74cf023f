//! Common types and utilities shared across TruthShield crates.
//!
//! This crate holds the pieces every other crate needs: the shared error
//! type, the tunables of the response normalizer, and the tracing setup.
//! It stays dependency-light so the normalizer can depend on it without
//! dragging in the HTTP stack.
//!
//! # Overview
//!
//! - [`NormalizerSettings`]: limits and vocabularies used while parsing LLM output
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`TruthShieldError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use truthshield_common::NormalizerSettings;
//!
//! let settings = NormalizerSettings::default();
//! assert_eq!(settings.html_snippet_chars, 500);
//! assert!(settings.propaganda_terms.iter().any(|t| t == "cherry-picked"));
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Words whose presence anywhere in a response is reported as a propaganda indicator.
pub const DEFAULT_PROPAGANDA_TERMS: &[&str] = &[
    "propaganda",
    "misleading",
    "deceptive",
    "exaggerated",
    "out of context",
    "bias",
    "cherry-picked",
    "misleadingly",
];

/// Country-code fragments that mark a source URL as non-US.
///
/// Matched as plain substrings of the URL, not as parsed TLDs.
pub const DEFAULT_INTERNATIONAL_TLDS: &[&str] =
    &[".uk", ".au", ".ca", ".eu", ".in", ".cn", ".jp", ".ru"];

/// Tunables for the response normalizer.
///
/// Every field has a default, so a partial YAML block only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    /// Maximum characters of an HTML body kept in `fullResponse`.
    pub html_snippet_chars: usize,
    /// Maximum characters of the JSON dump kept when the response shape is wrong.
    pub schema_dump_chars: usize,
    /// A labelled explanation section shorter than this is ignored.
    pub min_explanation_chars: usize,
    pub propaganda_terms: Vec<String>,
    pub international_tlds: Vec<String>,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            html_snippet_chars: 500,
            schema_dump_chars: 200,
            min_explanation_chars: 20,
            propaganda_terms: DEFAULT_PROPAGANDA_TERMS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            international_tlds: DEFAULT_INTERNATIONAL_TLDS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Error types used across the TruthShield system.
#[derive(thiserror::Error, Debug)]
pub enum TruthShieldError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An upstream LLM service could not be reached or rejected the call.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The submitted claim or URL could not be used.
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// Anything bubbling up from lower-level helpers.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`TruthShieldError`].
pub type Result<T> = std::result::Result<T, TruthShieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let parsed: NormalizerSettings =
            serde_json::from_str(r#"{ "html_snippet_chars": 120 }"#).unwrap();
        assert_eq!(parsed.html_snippet_chars, 120);
        assert_eq!(parsed.schema_dump_chars, 200);
        assert_eq!(parsed.international_tlds.len(), 8);
    }
}
