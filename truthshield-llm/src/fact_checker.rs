use crate::chat::message_content;
use crate::prompts;
use crate::traits::ChatClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use truthshield_common::{Result, TruthShieldError};
use truthshield_normalizer::{FactCheckRecord, Normalizer};
use uuid::Uuid;

/// What a user asked to have checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Submission {
    Claim(String),
    Url(String),
}

impl Submission {
    pub fn claim(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TruthShieldError::InvalidSubmission(
                "claim text is empty".to_string(),
            ));
        }
        Ok(Self::Claim(text))
    }

    /// Only absolute `http`/`https` URLs are accepted.
    pub fn url(raw: &str) -> Result<Self> {
        let parsed = url::Url::parse(raw.trim())
            .map_err(|e| TruthShieldError::InvalidSubmission(format!("invalid URL {raw:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TruthShieldError::InvalidSubmission(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(Self::Url(parsed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Claim(text) | Self::Url(text) => text,
        }
    }
}

/// Outcome of one fact-check request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: Uuid,
    pub submission: Submission,
    /// The claim actually sent to the verifier.
    pub claim: String,
    pub checked_at: DateTime<Utc>,
    pub record: FactCheckRecord,
}

/// Preprocess, verify, normalize.
///
/// ```no_run
/// use std::sync::Arc;
/// use truthshield_llm::chat::ChatCompletionsClient;
/// use truthshield_llm::fact_checker::{FactChecker, Submission};
/// use truthshield_normalizer::Normalizer;
///
/// # async fn demo() -> truthshield_common::Result<()> {
/// let verifier = ChatCompletionsClient::perplexity("pplx-key", "sonar-pro")?;
/// let checker = FactChecker::new(Arc::new(verifier), Normalizer::default());
/// let verification = checker
///     .check(Submission::claim("The Great Wall is visible from space")?)
///     .await?;
/// println!("{:?}", verification.record.verdict);
/// # Ok(()) }
/// ```
pub struct FactChecker {
    verifier: Arc<dyn ChatClient>,
    preprocessor: Option<Arc<dyn ChatClient>>,
    normalizer: Normalizer,
}

impl FactChecker {
    pub fn new(verifier: Arc<dyn ChatClient>, normalizer: Normalizer) -> Self {
        Self {
            verifier,
            preprocessor: None,
            normalizer,
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn ChatClient>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn verifier(&self) -> &Arc<dyn ChatClient> {
        &self.verifier
    }

    pub fn preprocessor(&self) -> Option<&Arc<dyn ChatClient>> {
        self.preprocessor.as_ref()
    }

    /// Run one submission through the pipeline.
    ///
    /// Only a failed verifier call is an error. Whatever the verifier returns
    /// is normalized, so malformed answers arrive as degraded records.
    pub async fn check(&self, submission: Submission) -> Result<Verification> {
        let id = Uuid::new_v4();
        let claim = self.claim_for(&submission).await;
        tracing::info!(%id, model = self.verifier.model_name(), claim_len = claim.len(), "fact_check.start");

        let request = prompts::verification_request(&claim);
        let body = self.verifier.complete(&request).await.map_err(|e| {
            tracing::warn!(%id, error = %e, "fact_check.verifier.error");
            e
        })?;

        let record = self.normalizer.normalize_body(&body);
        tracing::info!(
            %id,
            verdict = ?record.verdict,
            sources = record.sources.len(),
            degraded = record.is_degraded(),
            "fact_check.completed"
        );

        Ok(Verification {
            id,
            submission,
            claim,
            checked_at: Utc::now(),
            record,
        })
    }

    /// The claim text to verify. Preprocessing failures never abort a check.
    async fn claim_for(&self, submission: &Submission) -> String {
        let fallback = match submission {
            Submission::Claim(text) => text.trim().to_string(),
            Submission::Url(url) => prompts::url_as_claim(url),
        };
        let Some(preprocessor) = &self.preprocessor else {
            return fallback;
        };

        let request = match submission {
            Submission::Claim(text) => prompts::claim_extraction_request(text),
            Submission::Url(url) => prompts::url_extraction_request(url),
        };
        match preprocessor.complete(&request).await {
            Ok(body) => match message_content(&body).map(|c| c.trim().to_string()) {
                Some(claim) if !claim.is_empty() => {
                    tracing::debug!(model = preprocessor.model_name(), "fact_check.preprocess.ok");
                    claim
                }
                _ => {
                    tracing::warn!(
                        model = preprocessor.model_name(),
                        "fact_check.preprocess.unusable_response"
                    );
                    fallback
                }
            },
            Err(e) => {
                tracing::warn!(
                    model = preprocessor.model_name(),
                    error = %e,
                    "fact_check.preprocess.error"
                );
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ChatRequest;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use truthshield_normalizer::{FailureKind, Verdict};

    /// Replays canned bodies and records the user text of every request.
    struct Scripted {
        replies: Mutex<Vec<Result<String>>>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatClient for Scripted {
        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push(request.user_text().unwrap_or_default().to_string());
            self.replies.lock().unwrap().remove(0)
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn completion(content: &str) -> Result<String> {
        Ok(json!({ "choices": [{ "message": { "content": content } }] }).to_string())
    }

    #[test]
    fn submissions_are_validated() {
        assert!(Submission::claim("   ").is_err());
        assert!(Submission::url("not a url").is_err());
        assert!(Submission::url("ftp://example.com/file").is_err());
        assert_eq!(
            Submission::url(" https://example.com/a ").unwrap().as_str(),
            "https://example.com/a"
        );
    }

    #[tokio::test]
    async fn preprocessed_claim_is_verified() {
        let preprocessor = Scripted::new(vec![completion("Vaccines contain microchips.")]);
        let verifier = Scripted::new(vec![completion(
            "[VERDICT] False\n[EXPLANATION] No vaccine contains tracking hardware [1].\n[SOURCES]\n[1] - Health agency",
        )]);

        let checker = FactChecker::new(verifier.clone(), Normalizer::default())
            .with_preprocessor(preprocessor.clone());
        let verification = checker
            .check(Submission::claim("saw a post saying vaccines have chips??").unwrap())
            .await
            .unwrap();

        assert_eq!(verification.claim, "Vaccines contain microchips.");
        assert_eq!(verification.record.verdict, Verdict::False);
        assert!(verifier.seen()[0].ends_with("Vaccines contain microchips."));
        assert!(preprocessor.seen()[0].contains("vaccines have chips"));
    }

    #[tokio::test]
    async fn failed_preprocessing_falls_back_to_submission() {
        let preprocessor = Scripted::new(vec![Err(TruthShieldError::Upstream("503".into()))]);
        let verifier = Scripted::new(vec![completion("[VERDICT] True\n[EXPLANATION] Confirmed by the census office.")]);

        let checker = FactChecker::new(verifier.clone(), Normalizer::default())
            .with_preprocessor(preprocessor);
        let verification = checker
            .check(Submission::claim("  The city has 2 million residents ").unwrap())
            .await
            .unwrap();

        assert_eq!(verification.claim, "The city has 2 million residents");
        assert_eq!(verification.record.verdict, Verdict::True);
    }

    #[tokio::test]
    async fn html_from_verifier_is_a_degraded_record() {
        let verifier = Scripted::new(vec![Ok("<!DOCTYPE html><html>blocked</html>".to_string())]);
        let checker = FactChecker::new(verifier, Normalizer::default());
        let verification = checker
            .check(Submission::claim("anything").unwrap())
            .await
            .unwrap();
        assert_eq!(
            verification.record.failure,
            Some(FailureKind::TransportFormat)
        );
    }

    #[tokio::test]
    async fn verifier_failure_propagates() {
        let verifier = Scripted::new(vec![Err(TruthShieldError::Upstream("timeout".into()))]);
        let checker = FactChecker::new(verifier, Normalizer::default());
        let err = checker
            .check(Submission::claim("anything").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TruthShieldError::Upstream(_)));
    }

    #[tokio::test]
    async fn url_without_preprocessor_is_described_to_verifier() {
        let verifier = Scripted::new(vec![completion("[VERDICT] Mixed")]);
        let checker = FactChecker::new(verifier.clone(), Normalizer::default());
        let verification = checker
            .check(Submission::url("https://news.example.com/story").unwrap())
            .await
            .unwrap();
        assert!(verification.claim.contains("https://news.example.com/story"));
        assert_eq!(verification.record.verdict, Verdict::PartiallyTrue);
    }
}
