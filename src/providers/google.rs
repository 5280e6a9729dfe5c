/*!
 * Google Cloud Translation (v2 REST) provider.
 *
 * One `POST /language/translate/v2` per text. Requests authenticate with an
 * API key or an OAuth access token. Transient failures (connection, quota,
 * server errors) are retried with exponential backoff.
 */

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::app_config::{TextFormat, TranslationConfig};
use crate::errors::ProviderError;
use crate::providers::{Provider, TranslateRequest, TranslationResult};

// Upper bound for a single retry delay
const MAX_BACKOFF_MS: u64 = 60_000;

/// Google Cloud Translation (v2 REST) client
#[derive(Debug)]
pub struct GoogleTranslate {
    /// HTTP client for API requests
    client: Client,
    /// API key sent as the `key` query parameter
    api_key: String,
    /// OAuth access token sent as a bearer token
    access_token: String,
    /// Quota project for token-authenticated requests
    quota_project: Option<String>,
    /// Service base URL
    endpoint: String,
    /// Source text format
    format: TextFormat,
    /// Optional translation model (`base`, `nmt`)
    model: Option<String>,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Request body of `POST /language/translate/v2`
#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    q: [&'a str; 1],
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<TranslationItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationItem {
    translated_text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

impl GoogleTranslate {
    /// Create a client from the translation settings
    pub fn new(config: &TranslationConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.trim().to_string(),
            access_token: config.access_token.trim().to_string(),
            quota_project: config.quota_project.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            format: config.format,
            model: config.model.clone(),
            max_retries: config.retry_count,
            backoff_base_ms: config.retry_backoff_ms,
        })
    }

    fn api_url(&self) -> String {
        format!("{}/language/translate/v2", self.endpoint)
    }

    /// One request, no retry
    async fn translate_once(&self, request: &TranslateRequest) -> Result<TranslationResult, ProviderError> {
        let body = TranslateBody {
            q: [request.text.as_str()],
            target: &request.target_language,
            format: self.format.as_str(),
            source: request.source_language.as_deref(),
            model: self.model.as_deref(),
        };

        let mut builder = self.client.post(self.api_url()).json(&body);
        if !self.api_key.is_empty() {
            builder = builder.query(&[("key", self.api_key.as_str())]);
        }
        if !self.access_token.is_empty() {
            builder = builder.bearer_auth(&self.access_token);
            if let Some(project) = &self.quota_project {
                builder = builder.header("x-goog-user-project", project.as_str());
            }
        }

        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(map_status_error(status, &text));
        }

        parse_translation(&text, &request.text)
    }
}

#[async_trait]
impl Provider for GoogleTranslate {
    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationResult, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.translate_once(request).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff_ms = backoff_delay_ms(self.backoff_base_ms, attempt);
                    warn!(
                        "Translation request failed ({}), retrying in {} ms - attempt {}/{}",
                        e,
                        backoff_ms,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

/// Delay before retry `attempt` (1-based), doubled each time and capped
fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() || e.is_connect() {
        ProviderError::ConnectionError(e.to_string())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}

/// Map a non-2xx response to a provider error
fn map_status_error(status: StatusCode, body: &str) -> ProviderError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let quota_reason = envelope
        .as_ref()
        .map(|e| {
            e.error.errors.iter().any(|d| {
                let reason = d.reason.to_lowercase();
                reason.contains("limit") || reason.contains("quota")
            })
        })
        .unwrap_or(false);

    debug!("Translation API error body ({}): {}", status, body);

    match status {
        StatusCode::UNAUTHORIZED => ProviderError::AuthenticationError(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
        StatusCode::FORBIDDEN if quota_reason => ProviderError::RateLimitExceeded(message),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        },
    }
}

/// Parse a successful response body into the first translation
fn parse_translation(body: &str, input: &str) -> Result<TranslationResult, ProviderError> {
    let response: TranslateResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::ParseError(e.to_string()))?;

    let item = response
        .data
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::ParseError("Response contains no translations".to_string()))?;

    Ok(TranslationResult {
        translated_text: item.translated_text,
        detected_source_language: item.detected_source_language,
        input: input.to_string(),
        model: item.model,
    })
}
