mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use truthshield_common::TruthShieldError;
use truthshield_llm::chat::ChatCompletionsClient;
use truthshield_llm::traits::ChatClient;
use truthshield_llm::{FactChecker, Submission};
use truthshield_normalizer::{FailureKind, Normalizer, Verdict};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, model: &str) -> ChatCompletionsClient {
    ChatCompletionsClient::new(&format!("{}/", server.uri()), "test-key", model)
        .expect("client")
        .with_timeout(Duration::from_secs(5))
        .with_retries(0)
}

fn perplexity_body() -> serde_json::Value {
    json!({
        "id": "cmpl-1",
        "model": "sonar-pro",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": "**VERDICT:** Partially True\n\n**EXPLANATION:** The bridge opened in 1937 [1], but it was not the longest suspension bridge for long [2].\n\n**SOURCES:**\n1. Bridge history - https://history.example.org/bridge\n2. Engineering record - https://records.example.co.uk/spans"
            }
        }],
        "citations": [
            "https://history.example.org/bridge",
            "https://records.example.co.uk/spans"
        ]
    })
}

#[tokio::test]
async fn verifies_preprocessed_claim_end_to_end() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "rewriter" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "The Golden Gate Bridge opened in 1937 as the world's longest suspension bridge." } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "sonar-pro" })))
        .and(body_string_contains("longest suspension bridge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(perplexity_body()))
        .expect(1)
        .mount(&server)
        .await;

    let checker = FactChecker::new(Arc::new(client(&server, "sonar-pro")), Normalizer::default())
        .with_preprocessor(Arc::new(client(&server, "rewriter")));

    let verification = checker
        .check(Submission::claim("golden gate = longest bridge ever, opened 1937").unwrap())
        .await
        .expect("check succeeds");

    let record = &verification.record;
    assert_eq!(record.verdict, Verdict::PartiallyTrue);
    assert_eq!(record.sources.len(), 2);
    assert_eq!(record.sources[0].title, "Bridge history");
    assert_eq!(
        record.resolve_citation(2).map(|r| r.url.as_str()),
        Some("https://records.example.co.uk/spans")
    );
    assert!(record.source_balance.has_international_sources);

    let value = serde_json::to_value(&verification).unwrap();
    assert_eq!(value["submission"]["kind"], "claim");
    assert!(value["checkedAt"].is_string());
    assert_eq!(value["record"]["verdict"], "partially_true");
}

#[tokio::test]
async fn html_served_with_200_becomes_degraded_record() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<!DOCTYPE html><html><body>Cloudflare</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let checker = FactChecker::new(Arc::new(client(&server, "sonar-pro")), Normalizer::default());
    let verification = checker
        .check(Submission::claim("anything").unwrap())
        .await
        .expect("a record, not an error");

    assert_eq!(verification.record.verdict, Verdict::False);
    assert_eq!(verification.record.failure, Some(FailureKind::TransportFormat));
    assert!(verification.record.sources.is_empty());
}

#[tokio::test]
async fn upstream_error_status_is_an_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "bad key" } })),
        )
        .mount(&server)
        .await;

    let checker = FactChecker::new(Arc::new(client(&server, "sonar-pro")), Normalizer::default());
    let err = checker
        .check(Submission::claim("anything").unwrap())
        .await
        .expect_err("401 is not a record");
    match err {
        TruthShieldError::Upstream(message) => assert!(message.contains("bad key")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn health_check_reports_reachability() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "OK" } }]
        })))
        .mount(&server)
        .await;

    assert!(client(&server, "sonar-pro").health_check().await.unwrap());

    let dead = ChatCompletionsClient::new("http://127.0.0.1:9/", "test-key", "sonar-pro")
        .unwrap()
        .with_retries(0)
        .with_timeout(Duration::from_millis(500));
    assert!(!dead.health_check().await.unwrap());
}
