use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use medcoord_common::{MedcoordError, Result};
use serde::{Deserialize, Serialize};

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::gemini::GeminiClient;
use crate::offline::OfflineClient;
use crate::openai::OpenAiClient;
use crate::retry::{RetryConfig, RetryingClient};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini", "openai" or "offline"
    #[serde(default = "default_provider")]
    pub provider_type: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// If not set, read from GEMINI_API_KEY / OPENAI_API_KEY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_provider() -> String {
    "gemini".into()
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_timeout() -> u64 {
    30000
}

fn default_max_concurrent() -> usize {
    2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider(),
            model: default_model(),
            api_key: None,
            api_url: None,
            temperature: None,
            max_tokens: None,
            timeout_ms: default_timeout(),
            max_concurrent_requests: default_max_concurrent(),
            retry: RetryConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from config or environment variables.
    ///
    /// Priority:
    /// 1. Explicit non-empty `api_key`
    /// 2. `GEMINI_API_KEY` (falling back to `API_KEY`) for gemini,
    ///    `OPENAI_API_KEY` for openai
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        match self.provider_type.as_str() {
            "gemini" => std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok(),
            "openai" => std::env::var("OPENAI_API_KEY").ok(),
            _ => None,
        }
    }
}

pub struct SemaphoredClient {
    inner: Arc<dyn LlmClient>,
    semaphore: Arc<tokio::sync::Semaphore>,
}

impl SemaphoredClient {
    pub fn new(inner: Arc<dyn LlmClient>, max_concurrent: usize) -> Self {
        Self {
            inner,
            semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent.max(1))),
        }
    }
}

#[async_trait]
impl LlmClient for SemaphoredClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| MedcoordError::Llm(format!("Semaphore acquire failed: {e}")))?;
        self.inner.complete(request).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

fn http_client(config: &LlmConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
        .map_err(|e| MedcoordError::Config(format!("Failed to build HTTP client: {e}")))
}

pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let base_client: Box<dyn LlmClient> = match config.provider_type.as_str() {
        "gemini" => {
            let api_key = config.resolve_api_key().ok_or_else(|| {
                MedcoordError::Config(
                    "Gemini requires an API key (set api_key or GEMINI_API_KEY)".to_string(),
                )
            })?;
            Box::new(
                GeminiClient::new(config.api_url.clone(), config.model.clone(), api_key)
                    .with_http_client(http_client(config)?),
            )
        }
        "openai" => Box::new(
            OpenAiClient::new(
                config.api_url.clone(),
                config.model.clone(),
                config.resolve_api_key(),
            )
            .with_http_client(http_client(config)?),
        ),
        "offline" => Box::new(OfflineClient::new()),
        other => {
            return Err(MedcoordError::Config(format!(
                "Unknown provider_type '{other}' (expected gemini, openai or offline)"
            )));
        }
    };

    let retrying: Arc<dyn LlmClient> =
        Arc::new(RetryingClient::new(base_client, config.retry.clone()));
    Ok(Arc::new(SemaphoredClient::new(
        retrying,
        config.max_concurrent_requests,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tokio::task::JoinSet;

    #[test]
    fn empty_table_gives_gemini_defaults() {
        let config: LlmConfig = toml::from_str("").unwrap();
        assert_eq!(config.provider_type, "gemini");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.max_concurrent_requests, 2);
        assert_eq!(config.retry.max_retries, 0);
        assert!(config.temperature.is_none());
    }

    #[test]
    fn openai_compatible_table() {
        let config: LlmConfig = toml::from_str(
            r#"
provider_type = "openai"
model = "qwen2.5:7b"
api_url = "http://localhost:11434"
max_tokens = 1024
max_concurrent_requests = 1

[retry]
max_retries = 3
backoff_multiplier = 1.5
"#,
        )
        .unwrap();
        assert_eq!(config.provider_type, "openai");
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.max_tokens, Some(1024));
        assert_eq!(config.max_concurrent_requests, 1);
        assert_eq!(config.retry.max_retries, 3);
        // unspecified retry fields keep their defaults
        assert_eq!(config.retry.initial_delay_ms, 500);
    }

    #[test]
    fn explicit_key_wins_over_environment() {
        let config = LlmConfig {
            api_key: Some("AIza-test".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("AIza-test"));
    }

    #[test]
    fn offline_provider_never_needs_a_key() {
        let config = LlmConfig {
            provider_type: "offline".to_string(),
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
        let client = build_llm_client(&config).unwrap();
        assert_eq!(client.model_name(), "offline-keyword");
    }

    #[test]
    fn builds_each_network_provider() {
        let gemini = LlmConfig {
            api_key: Some("AIza-test".to_string()),
            ..Default::default()
        };
        assert_eq!(build_llm_client(&gemini).unwrap().model_name(), "gemini-2.5-flash");

        let openai = LlmConfig {
            provider_type: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        assert_eq!(build_llm_client(&openai).unwrap().model_name(), "gpt-4o-mini");
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let config = LlmConfig {
            provider_type: "vertex".to_string(),
            ..Default::default()
        };
        let Err(err) = build_llm_client(&config) else {
            panic!("expected an error");
        };
        assert_eq!(err.code(), "config_error");
    }

    /// Tracks how many calls are in flight at once.
    #[derive(Default)]
    struct InFlight {
        counts: Mutex<(usize, usize)>,
    }

    #[async_trait]
    impl LlmClient for InFlight {
        async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
            {
                let mut counts = self.counts.lock();
                counts.0 += 1;
                counts.1 = counts.1.max(counts.0);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.counts.lock().0 -= 1;
            Ok(LlmResponse::text("selesai"))
        }

        fn model_name(&self) -> &str {
            "in-flight"
        }
    }

    #[tokio::test]
    async fn semaphore_caps_in_flight_calls() {
        let inner = Arc::new(InFlight::default());
        let client = Arc::new(SemaphoredClient::new(inner.clone(), 2));

        let mut tasks = JoinSet::new();
        for _ in 0..5 {
            let client = Arc::clone(&client);
            tasks.spawn(async move { client.complete(LlmRequest::default()).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap().content, "selesai");
        }

        let (now, peak) = *inner.counts.lock();
        assert_eq!(now, 0);
        assert!(peak <= 2, "peak {peak}");
    }
}
