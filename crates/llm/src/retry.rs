//! Optional backoff for transient model failures.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use medcoord_common::{MedcoordError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{LlmClient, LlmRequest, LlmResponse};

static STATUS_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\berror (\d{3})\b").expect("valid regex"));
static RETRY_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)retry-after:?\s*(\d+)").expect("valid regex"));

/// Backoff policy for transient model errors.
///
/// `max_retries` defaults to zero: a failed model call surfaces to the user
/// as a single error turn unless retries are enabled in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (zero based), with up to 10% jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let jittered = base * (1.0 + 0.1 * rand::random::<f64>());
        Duration::from_millis((jittered as u64).min(self.max_delay_ms))
    }
}

/// HTTP status embedded in an adapter error such as `Gemini API error 503 ...`.
fn status_code(message: &str) -> Option<u16> {
    STATUS_CODE
        .captures(message)
        .and_then(|caps| caps[1].parse().ok())
}

/// Rate limits and server-side failures are worth another attempt; bad
/// requests, auth failures and decoding errors are not.
fn is_transient(err: &MedcoordError) -> bool {
    let MedcoordError::Llm(message) = err else {
        return false;
    };
    match status_code(message) {
        Some(code) => code == 429 || (500..600).contains(&code),
        None => {
            let lower = message.to_lowercase();
            lower.contains("request failed") || lower.contains("timed out")
        }
    }
}

fn retry_after(message: &str) -> Option<Duration> {
    RETRY_AFTER
        .captures(message)
        .and_then(|caps| caps[1].parse().ok())
        .map(Duration::from_secs)
}

pub struct RetryingClient<T: LlmClient> {
    inner: T,
    config: RetryConfig,
}

impl<T: LlmClient> RetryingClient<T> {
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl<T: LlmClient> LlmClient for RetryingClient<T> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let mut attempt = 0;
        loop {
            let err = match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            if attempt >= self.config.max_retries || !is_transient(&err) {
                return Err(err);
            }

            let message = err.to_string();
            let delay = retry_after(&message)
                .map(|d| d.min(Duration::from_millis(self.config.max_delay_ms)))
                .unwrap_or_else(|| self.config.backoff(attempt));
            attempt += 1;
            warn!(
                attempt,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %message,
                "Retrying model call"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedClient;

    fn llm(message: &str) -> MedcoordError {
        MedcoordError::Llm(message.to_string())
    }

    #[test]
    fn classifies_adapter_errors() {
        assert!(is_transient(&llm("Gemini API error 503 Service Unavailable: overloaded")));
        assert!(is_transient(&llm("OpenAI API error 429 Too Many Requests: slow down")));
        assert!(is_transient(&llm("Gemini request failed: connection reset")));
        assert!(!is_transient(&llm("OpenAI API error 401 Unauthorized: bad key")));
        assert!(!is_transient(&llm("Failed to parse Gemini response: EOF")));
        assert!(!is_transient(&MedcoordError::MultipleToolCalls(2)));
    }

    #[test]
    fn reads_retry_after_header() {
        assert_eq!(
            retry_after("error 429: Retry-After: 7"),
            Some(Duration::from_secs(7))
        );
        assert_eq!(retry_after("error 429"), None);
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let config = RetryConfig {
            max_retries: 4,
            initial_delay_ms: 100,
            max_delay_ms: 1_000,
            backoff_multiplier: 3.0,
        };
        let first = config.backoff(0);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(110));
        assert_eq!(config.backoff(5), Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn retries_transient_errors_when_enabled() {
        let script = ScriptedClient::new();
        script
            .push_error("Gemini API error 503 Service Unavailable")
            .push(LlmResponse::text("pulih"));
        let client = RetryingClient::new(
            script,
            RetryConfig {
                max_retries: 2,
                initial_delay_ms: 1,
                max_delay_ms: 5,
                backoff_multiplier: 1.0,
            },
        );

        let response = client.complete(LlmRequest::default()).await.unwrap();
        assert_eq!(response.content, "pulih");
        assert_eq!(client.inner.requests().len(), 2);
    }

    #[tokio::test]
    async fn default_config_does_not_retry() {
        let script = ScriptedClient::new();
        script
            .push_error("Gemini API error 503 Service Unavailable")
            .push(LlmResponse::text("never"));
        let client = RetryingClient::new(script, RetryConfig::default());

        assert!(client.complete(LlmRequest::default()).await.is_err());
        assert_eq!(client.inner.requests().len(), 1);
    }
}
