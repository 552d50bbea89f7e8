//! GraphQL over HTTP.
//!
//! Callers get the response `data` or one of:
//! - `Transport`: no structured response (connect failure, timeout,
//!   unparseable body, bare HTTP error).
//! - `PartialApi`: the server answered, but the body carries `errors`
//!   (with whatever `data` came back alongside).
//! - `RateLimited`: after the retry budget is spent.
//! - `Unauthorized`: the server rejected the key.

use crate::error::{LnrError, Result};
use crate::secret::Secret;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.linear.app/graphql";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(60);
/// Used when the server signals rate limiting without a usable Retry-After.
pub const FALLBACK_RETRY_DELAY: Duration = Duration::from_secs(1);

const RATE_LIMITED_CODE: &str = "RATELIMITED";
const AUTH_ERROR_CODES: &[&str] = &["AUTHENTICATION_ERROR", "FORBIDDEN"];
const BODY_EXCERPT_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// The seam every higher component talks through. `HttpTransport` is the
/// real one; tests substitute in-memory fakes.
pub trait Transport {
    fn query(&self, document: &str, variables: Value) -> Result<Value>;

    /// Identical on the wire; kept separate so call sites say what they mean.
    fn mutate(&self, document: &str, variables: Value) -> Result<Value> {
        self.query(document, variables)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn query(&self, document: &str, variables: Value) -> Result<Value> {
        (**self).query(document, variables)
    }

    fn mutate(&self, document: &str, variables: Value) -> Result<Value> {
        (**self).mutate(document, variables)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        GraphqlError {
            message: message.into(),
            path: Vec::new(),
            extensions: None,
        }
    }

    /// `extensions.code`, if the server sent one.
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

#[derive(Serialize)]
struct Request<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

// ---------------------------------------------------------------------------
// Response interpretation
// ---------------------------------------------------------------------------

/// Map one HTTP response to the `data` value or an error. Pure, so every
/// branch is testable without a server.
pub fn interpret_response(status: StatusCode, retry_after: Option<Duration>, body: &str) -> Result<Value> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LnrError::RateLimited {
            retry_after: retry_after.unwrap_or(FALLBACK_RETRY_DELAY),
        });
    }

    let envelope = serde_json::from_str::<Envelope>(body).ok();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let message = envelope
            .as_ref()
            .and_then(|e| e.errors.as_ref())
            .and_then(|errs| errs.first())
            .map(|e| e.message.clone())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        return Err(LnrError::Unauthorized(message));
    }

    let Some(envelope) = envelope else {
        return Err(if status.is_success() {
            LnrError::Transport(format!("malformed response body: {}", excerpt(body)))
        } else {
            LnrError::Transport(format!("HTTP {}: {}", status.as_u16(), excerpt(body)))
        });
    };

    let errors = envelope.errors.unwrap_or_default();
    if !errors.is_empty() {
        if errors.iter().any(|e| e.code() == Some(RATE_LIMITED_CODE)) {
            return Err(LnrError::RateLimited {
                retry_after: retry_after.unwrap_or(FALLBACK_RETRY_DELAY),
            });
        }
        if let Some(auth) = errors
            .iter()
            .find(|e| e.code().is_some_and(|c| AUTH_ERROR_CODES.contains(&c)))
        {
            return Err(LnrError::Unauthorized(auth.message.clone()));
        }
        return Err(LnrError::PartialApi {
            errors,
            data: envelope.data.filter(|d| !d.is_null()),
        });
    }

    if !status.is_success() {
        return Err(LnrError::Transport(format!(
            "HTTP {}: {}",
            status.as_u16(),
            excerpt(body)
        )));
    }

    Ok(envelope.data.unwrap_or(Value::Null))
}

/// Seconds form only (`Retry-After: 12`, fractional accepted). Values past
/// what a `Duration` holds saturate; the retry loop caps the sleep anyway.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(BODY_EXCERPT_LEN).collect();
    format!("{cut}…")
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub endpoint: String,
    pub timeout: Duration,
    /// Total attempts when rate limited, including the first.
    pub max_attempts: u32,
    /// Upper bound on a single server-requested wait.
    pub max_retry_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
        }
    }
}

pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig, secret: &Secret) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", secret.expose()))
            .map_err(|_| LnrError::Validation("API key contains invalid characters".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("lnr/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(HttpTransport { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn execute(&self, operation: &str, document: &str, variables: &Value) -> Result<Value> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            tracing::debug!(operation, endpoint = %self.config.endpoint, attempt, "graphql request");
            match self.send_once(document, variables) {
                Err(LnrError::RateLimited { retry_after }) if attempt < max_attempts => {
                    let delay = retry_after.min(self.config.max_retry_delay);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn send_once(&self, document: &str, variables: &Value) -> Result<Value> {
        let resp = self
            .client
            .post(&self.config.endpoint)
            .json(&Request {
                query: document,
                variables,
            })
            .send()?;
        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = resp.text()?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "graphql response");
        interpret_response(status, retry_after, &body)
    }
}

impl Transport for HttpTransport {
    fn query(&self, document: &str, variables: Value) -> Result<Value> {
        self.execute("query", document, &variables)
    }

    fn mutate(&self, document: &str, variables: Value) -> Result<Value> {
        self.execute("mutation", document, &variables)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
