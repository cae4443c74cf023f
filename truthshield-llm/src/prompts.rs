//! Prompts sent to the upstream models.
//!
//! The verifier prompt fixes the `[VERDICT]` / `[EXPLANATION]` / `[SOURCES]`
//! layout the normalizer expects. Models drift from it, which is why the
//! normalizer also accepts bold and colon-style labels.

use crate::traits::ChatRequest;

pub const VERIFIER_SYSTEM_PROMPT: &str = r#"You are a meticulous, impartial fact-checker. Assess the claim against current, reputable sources and answer in exactly this format:

[VERDICT] True, False, or Partially True
[EXPLANATION] A concise explanation of the evidence. Cite sources inline with numbered markers such as [1] and [2].
[SOURCES]
[1] - Title of the first source - URL
[2] - Title of the second source - URL

Say explicitly when a claim is misleading, exaggerated, cherry-picked or taken out of context. Prefer primary sources and include international outlets where relevant."#;

pub const PREPROCESSOR_SYSTEM_PROMPT: &str = r#"You turn user submissions into a single self-contained factual claim that a fact-checker can verify. Keep names, numbers and dates. Respond with the claim only, without commentary."#;

pub fn verification_request(claim: &str) -> ChatRequest {
    ChatRequest::new(
        Some(VERIFIER_SYSTEM_PROMPT),
        format!("Fact-check the following claim:\n\n{claim}"),
    )
    .with_temperature(0.2)
}

pub fn claim_extraction_request(text: &str) -> ChatRequest {
    ChatRequest::new(
        Some(PREPROCESSOR_SYSTEM_PROMPT),
        format!("Submission:\n\n{text}"),
    )
    .with_temperature(0.0)
    .with_max_tokens(200)
}

pub fn url_extraction_request(url: &str) -> ChatRequest {
    ChatRequest::new(
        Some(PREPROCESSOR_SYSTEM_PROMPT),
        format!("State the main factual claim made by the article at {url}"),
    )
    .with_temperature(0.0)
    .with_max_tokens(200)
}

/// Verifier input for a URL when no preprocessor is configured.
pub fn url_as_claim(url: &str) -> String {
    format!("The main factual claims made in the article at {url}")
}
