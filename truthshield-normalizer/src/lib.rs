//! Structured fact-check records from free-text LLM output.
//!
//! A verification model answers in loosely formatted prose with `VERDICT`,
//! `EXPLANATION` and `SOURCES` blocks and `[n]` citation markers, sometimes
//! alongside a parallel `citations` URL list. This crate turns that into a
//! [`FactCheckRecord`] a presentation layer can render without further
//! parsing.
//!
//! Each heuristic lives in its own module so it can be tested and replaced
//! on its own:
//!
//! - [`sections`]: locating labelled blocks
//! - [`verdict`]: tri-state classification
//! - [`explanation`]: prose extraction and cleanup
//! - [`sources`]: source lines, citation reconciliation, ordering
//! - [`signals`]: propaganda vocabulary and source diversity
//!
//! [`Normalizer`] ties them together and never fails: transport, schema and
//! parse problems come back as degraded records.
//!
//! ```
//! use truthshield_normalizer::{Normalizer, RawLlmResponse, Verdict};
//!
//! let raw = RawLlmResponse::new(
//!     "Claim confirmed [1]. SOURCES: 1. - Example Site - https://example.com/a",
//!     Some(vec!["https://example.com/a".to_string()]),
//! );
//! let record = Normalizer::default().normalize(&raw);
//! assert_eq!(record.sources.len(), 1);
//! assert_eq!(record.source_refs[&1].url, "https://example.com/a");
//! ```

pub mod error;
pub mod explanation;
pub mod normalizer;
pub mod raw;
pub mod record;
pub mod sections;
pub mod signals;
pub mod sources;
pub mod verdict;

pub use error::NormalizeError;
pub use normalizer::{normalize, Normalizer};
pub use raw::RawLlmResponse;
pub use record::{FactCheckRecord, FailureKind, Source, SourceBalance, SourceRef, Verdict};
pub use truthshield_common::NormalizerSettings;
