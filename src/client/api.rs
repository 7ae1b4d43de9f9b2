//! HTTP client for the EcoPackAI recommendation service.

use super::RecommendationService;
use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    usage_entries, HealthPayload, HistoryPayload, QuestionnaireInput, Recommendation,
    RecommendPayload, Run, UsageEntry,
};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl From<&ServerConfig> for ClientSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            retries: config.retries,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

/// Client for the recommendation service REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    settings: ClientSettings,
}

impl ApiClient {
    /// Create a new client.
    pub fn new(settings: ClientSettings) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            settings,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request, retrying transient failures with exponential backoff.
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&QuestionnaireInput>,
    ) -> ApiResult<String> {
        let mut retries = 0;

        loop {
            let start = Instant::now();
            match self.execute(method.clone(), path, body).await {
                Ok(text) => {
                    debug!(
                        path = %path,
                        latency_ms = start.elapsed().as_millis(),
                        "Service call succeeded"
                    );
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && retries < self.settings.retries => {
                    retries += 1;
                    let delay = backoff_delay(self.settings.retry_delay_ms, retries);
                    warn!(
                        path = %path,
                        error = %e,
                        retry = retries,
                        delay_ms = delay.as_millis(),
                        "Retrying service request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if retries > 0 && e.is_retryable() => {
                    return Err(ApiError::Unavailable {
                        message: e.to_string(),
                        retries,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Execute a single request and return the body of a successful response.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&QuestionnaireInput>,
    ) -> ApiResult<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Calling recommendation service");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(text)
    }

    fn classify(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                timeout_secs: self.settings.timeout_seconds,
            }
        } else if e.is_connect() {
            ApiError::Connect {
                base_url: self.base_url.clone(),
            }
        } else {
            ApiError::Http(e)
        }
    }
}

/// Longest wait between two attempts.
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Delay before retry number `attempt` (1-based): `base_ms` doubled per
/// earlier retry, capped at [`MAX_RETRY_DELAY_MS`].
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 2_u64
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_RETRY_DELAY_MS))
}

/// Pull a readable message out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl RecommendationService for ApiClient {
    async fn recommend(&self, input: &QuestionnaireInput) -> ApiResult<Recommendation> {
        let body = self.call(Method::POST, "/recommend", Some(input)).await?;
        let payload: RecommendPayload = decode("/recommend", &body)?;
        let recommendation = Recommendation::from(payload);

        info!(
            category = %input.product_category,
            materials = recommendation.results.len(),
            ranked = recommendation.top10.len(),
            "Received recommendations"
        );
        Ok(recommendation)
    }

    async fn history(&self) -> ApiResult<Vec<Run>> {
        let body = self.call(Method::GET, "/history", None).await?;
        let payload: HistoryPayload = decode("/history", &body)?;
        debug!(runs = payload.history.len(), "Fetched history");
        Ok(payload.history)
    }

    async fn clear_history(&self) -> ApiResult<()> {
        self.call(Method::POST, "/history/clear", None).await?;
        info!("Server history cleared");
        Ok(())
    }

    async fn usage(&self) -> ApiResult<Vec<UsageEntry>> {
        let body = self.call(Method::GET, "/usage", None).await?;
        let raw: BTreeMap<String, u64> = decode("/usage", &body)?;
        Ok(usage_entries(raw))
    }

    async fn health(&self) -> ApiResult<String> {
        let body = self.call(Method::GET, "/", None).await?;
        let payload: HealthPayload = decode("/", &body)?;
        Ok(payload.status)
    }
}
