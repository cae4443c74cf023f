//! Upstream model integration for TruthShield.
//!
//! This crate exposes the [`traits::ChatClient`] interface, an
//! OpenAI-compatible implementation in [`chat`], the prompts that pin the
//! verifier's answer format, and [`fact_checker::FactChecker`], which chains
//! claim preprocessing, verification and normalization.
//!
//! # Examples
//! ```no_run
//! use std::sync::Arc;
//! use truthshield_llm::chat::ChatCompletionsClient;
//! use truthshield_llm::traits::ChatClient;
//!
//! # #[tokio::main]
//! # async fn main() -> truthshield_common::Result<()> {
//! let verifier: Arc<dyn ChatClient> =
//!     Arc::new(ChatCompletionsClient::perplexity("pplx-key", "sonar-pro")?);
//! assert!(verifier.health_check().await?);
//! # Ok(())
//! # }
//! ```
pub mod chat;
pub mod fact_checker;
pub mod prompts;
pub mod traits;

pub use fact_checker::{FactChecker, Submission, Verification};

/// Default model recommendations.
pub const DEFAULT_VERIFIER_MODEL: &str = "sonar-pro";
pub const DEFAULT_PREPROCESSOR_MODEL: &str = "gpt-4o-mini";
