//! HTTP client for the upstream LLM APIs, with safe logging and retries.
//!
//! - Request options: headers, `Auth`, timeout, retries
//! - Never logs secret values; only the auth kind is recorded
//! - Retries network failures, 429 and 5xx with exponential backoff and `Retry-After`
//! - Optional *raw* request/response logging via `TRUTHSHIELD_HTTP_RAW=1`
//!
//! [`HttpClient::post_json_text`] hands back a successful body untouched so
//! the caller can inspect payloads that are not what they claim to be (an
//! HTML error page served with a 200, for instance).
//!
//! ```no_run
//! # async fn demo() -> Result<(), truthshield_http::HttpError> {
//! let client = truthshield_http::HttpClient::new("https://api.example.com/v1/")?;
//! let body = serde_json::json!({ "model": "sonar" });
//! let raw: String = client
//!     .post_json_text("chat/completions", &body, truthshield_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: `tracing` events are emitted for request start, response
//! headers, body snippets (truncated), retries and final errors, plus raw
//! request/response lines (target `http.raw`) when `TRUTHSHIELD_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use uuid::Uuid;

const RAW_ENV: &str = "TRUTHSHIELD_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_CHARS: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

/// How a request authenticates.
///
/// ```
/// use truthshield_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// assert_eq!(bearer.kind(), "bearer");
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Custom header such as `x-api-key`.
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    None,
}

impl Auth<'_> {
    /// Label safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Header { .. } => "header",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs.
///
/// ```
/// use truthshield_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(60)),
///     retries: Some(1),
///     auth: Some(Auth::Bearer("pplx-demo")),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 60);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL. Keep the trailing slash on
    /// bases with a path (`https://api.openai.com/v1/`) so relative joins
    /// extend it.
    ///
    /// ```no_run
    /// use truthshield_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.perplexity.ai/")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(30),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// POST a JSON body and return the successful response body as text,
    /// whatever its content type.
    pub async fn post_json_text<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<String, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let bytes = self.execute(Method::POST, path, Some(body), &opts).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send with retries. Returns the body of the first successful response.
    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: &RequestOpts<'_>,
    ) -> Result<Vec<u8>, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let body_bytes = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| HttpError::Build(format!("failed to encode request body: {e}")))?;

        let bearer = match &opts.auth {
            Some(Auth::Bearer(tok)) => Some(sanitize_api_key(tok)?),
            _ => None,
        };

        let req_id = Uuid::new_v4().to_string();
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let auth_kind = opts.auth.as_ref().map_or("none", Auth::kind);
        let mut attempt = 0usize;

        loop {
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);
            if let Some(bytes) = &body_bytes {
                rb = rb
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }
            match (&opts.auth, &bearer) {
                (Some(Auth::Bearer(_)), Some(tok)) => rb = rb.bearer_auth(tok),
                (Some(Auth::Header { name, value }), _) => rb = rb.header(name, value),
                _ => {}
            }

            tracing::debug!(
                req_id = %req_id,
                attempt = attempt + 1,
                max_retries,
                method = %method,
                host_path = %format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                timeout_ms = timeout.as_millis() as u64,
                auth_kind,
                has_body = body_bytes.is_some(),
                "http.request.start"
            );

            if raw_enabled() {
                let headers = opts.headers.clone().unwrap_or_default();
                let curl = make_curl(&method, &url, &headers, auth_kind, body_bytes.as_deref());
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            let started = Instant::now();
            let outcome = match rb.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    resp.bytes()
                        .await
                        .map(|bytes| (status, headers, bytes.to_vec()))
                        .map_err(|err| ("http.retrying.network_body", err.to_string()))
                }
                Err(err) => Err(("http.retrying.network_send", err.to_string())),
            };

            let (status, headers, bytes) = match outcome {
                Ok(parts) => parts,
                Err((event, message)) => {
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id = %req_id,
                            attempt,
                            max_retries,
                            backoff_ms = delay.as_millis() as u64,
                            message = %message,
                            event
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        req_id = %req_id,
                        attempt,
                        max_retries,
                        message = %message,
                        "http.network_error"
                    );
                    return Err(HttpError::Network(message));
                }
            };
            let duration_ms = started.elapsed().as_millis() as u64;

            let upstream_id = headers
                .get("x-request-id")
                .or_else(|| headers.get("x-correlation-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            let content_type = headers
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");

            tracing::debug!(
                req_id = %req_id,
                %status,
                duration_ms,
                body_len = bytes.len(),
                content_type,
                x_request_id = %upstream_id,
                "http.response.headers"
            );

            if raw_enabled() {
                let hdrs = redact_headers(&headers);
                let truncated = bytes.len() > RAW_MAX_BODY;
                let shown = &bytes[..bytes.len().min(RAW_MAX_BODY)];
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    status = %status,
                    duration_ms,
                    headers = ?hdrs,
                    body = %String::from_utf8_lossy(shown),
                    truncated
                );
            }

            let snippet = snip_body(&bytes);
            tracing::trace!(req_id = %req_id, body_snippet = %snippet, "http.response.body_snippet");

            if status.is_success() {
                return Ok(bytes);
            }

            let message = extract_error_message(&bytes);
            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;
            if (is_429 || status.is_server_error()) && attempt < max_retries {
                attempt += 1;
                let retry_after = retry_after_secs(&headers);
                let delay = match retry_after {
                    Some(secs) => Duration::from_secs(secs),
                    None if is_429 => backoff(attempt).max(Duration::from_millis(1100)),
                    None => backoff(attempt),
                };
                tracing::warn!(
                    req_id = %req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms = delay.as_millis() as u64,
                    retry_after_secs = ?retry_after,
                    message = %message,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id = %req_id,
                %status,
                message = %message,
                x_request_id = %upstream_id,
                body_snippet = %snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id: upstream_id,
            });
        }
    }
}

/// 200ms, 400ms, 800ms, ...
fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64.saturating_mul(1u64 << shift))
}

fn retry_after_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

/// Best-effort curl command for reproducing a request. Credentials are never
/// rendered.
fn make_curl(
    method: &Method,
    url: &Url,
    headers: &HeaderMap,
    auth_kind: &str,
    body: Option<&[u8]>,
) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{method}")];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    if auth_kind != "none" {
        parts.push(format!("-H '<{auth_kind} auth redacted>'"));
    }
    if let Some(bytes) = body {
        let shown = &bytes[..bytes.len().min(RAW_MAX_BODY)];
        let mut text = String::from_utf8_lossy(shown).into_owned();
        if bytes.len() > RAW_MAX_BODY {
            text.push('…');
        }
        parts.push(format!("-d '{}'", text.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

fn is_secret_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == AUTHORIZATION.as_str()
        || lower.contains("api-key")
        || lower.contains("token")
        || lower.contains("secret")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

fn extract_error_message(body: &[u8]) -> String {
    // {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }

    // {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Envelope>(body) {
        return env.error.message;
    }
    if let Ok(flat) = serde_json::from_slice::<Flat>(body) {
        for candidate in [flat.message, flat.detail, flat.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build("API key contains control characters".into()));
    }
    HeaderValue::from_str(&format!("Bearer {s}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
