use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{LlmError, LlmResult};
use crate::json::extract_json;
use crate::service::{Completion, CompletionRequest, ReasoningService};
use crate::types::*;

const DEFAULT_MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;
const MAX_BACKOFF_MS: u64 = 60000;

/// Backoff schedule for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }
}

/// Client for OpenRouter-compatible chat completion APIs
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl OpenRouterClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: F,
        operation_name: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = LlmResult<T>>,
    {
        let mut retries = 0;
        let mut backoff = self.retry.initial_backoff;

        loop {
            if cancel.is_cancelled() {
                return Err(LlmError::Cancelled);
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(LlmError::Cancelled),
                result = operation() => result,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if retries >= self.retry.max_retries {
                        error!(
                            "{} failed after {} retries: {}",
                            operation_name, retries, e
                        );
                        return Err(e);
                    }

                    let wait = match &e {
                        LlmError::RateLimited {
                            retry_after: Some(secs),
                        } => Duration::from_secs(*secs),
                        _ => backoff,
                    }
                    .min(self.retry.max_backoff);

                    warn!(
                        "{} failed ({}), retrying in {}ms (attempt {}/{})",
                        operation_name,
                        e,
                        wait.as_millis(),
                        retries + 1,
                        self.retry.max_retries
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(LlmError::Cancelled),
                        _ = tokio::time::sleep(wait) => {}
                    }
                    retries += 1;
                    backoff = (backoff * 2).min(self.retry.max_backoff);
                }
                Err(e) => {
                    if retries > 0 {
                        info!(
                            "{} failed after {} retries: {}",
                            operation_name, retries, e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    pub async fn chat_completion(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> LlmResult<Completion> {
        let name = if request.label.is_empty() {
            "chat_completion"
        } else {
            request.label.as_str()
        };

        self.with_retry(|| self.chat_completion_inner(request), name, cancel)
            .await
    }

    async fn chat_completion_inner(&self, request: &CompletionRequest) -> LlmResult<Completion> {
        debug!(
            model = %request.model,
            label = %request.label,
            "Creating chat completion with {} messages",
            request.messages.len()
        );

        let body = ChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.schema.as_ref().map(|s| ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: s.name.clone(),
                    strict: true,
                    schema: s.schema.clone(),
                },
            }),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Rate limited by OpenRouter");
                return Err(LlmError::RateLimited { retry_after });
            }

            if let Ok(error_resp) = serde_json::from_str::<OpenRouterError>(&error_text) {
                error!(
                    "OpenRouter API error: {} (type: {:?})",
                    error_resp.error.message, error_resp.error.error_type
                );
                return Err(LlmError::Api {
                    message: error_resp.error.message,
                    status_code: Some(status.as_u16()),
                });
            }

            return Err(LlmError::Api {
                message: error_text,
                status_code: Some(status.as_u16()),
            });
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyResponse {
                model: request.model.clone(),
            })?;

        let structured = if request.schema.is_some() {
            extract_json(&content)
        } else {
            None
        };

        Ok(Completion {
            content,
            structured,
        })
    }
}

#[async_trait]
impl ReasoningService for OpenRouterClient {
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> LlmResult<Completion> {
        self.chat_completion(&request, cancel).await
    }
}
