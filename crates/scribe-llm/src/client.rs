//! HTTP chat-completions client

use crate::wire::{error_excerpt, ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use scribe_core::{GenerationConfig, GenerationError, GenerationRequest, GenerationService};
use std::time::Duration;

/// Client construction failures
#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    /// API key variable unset or blank
    #[error("API key not found in environment variable {var}")]
    MissingApiKey {
        /// Variable name consulted
        var: String,
    },

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Generation service backed by a chat-completions endpoint
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    request_timeout: Duration,
}

impl ChatClient {
    /// Create client
    ///
    /// `request_timeout` is a transport ceiling; per-stage budgets are
    /// applied by the orchestrator.
    ///
    /// # Errors
    /// `LlmClientError::Build` if the HTTP client cannot be constructed
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, LlmClientError> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.into(),
            request_timeout,
        })
    }

    /// Create client from configuration and the process environment
    ///
    /// # Errors
    /// `LlmClientError::MissingApiKey` when the configured variable is unset
    /// or blank
    pub fn from_config(config: &GenerationConfig) -> Result<Self, LlmClientError> {
        let from_env = std::env::var(&config.api_key_env).ok();
        let api_key = resolve_api_key(&config.api_key_env, from_env)?;
        let ceiling = config.content_timeout().max(config.style_timeout());
        Self::new(&config.base_url, config.model.clone(), api_key, ceiling)
    }

    /// Full completions URL
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Model name
    #[inline]
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        request: GenerationRequest,
        stage: &'static str,
    ) -> Result<String, GenerationError> {
        let body = ChatCompletionRequest::new(&self.model, &request);
        tracing::debug!(
            stage,
            model = %self.model,
            system_chars = request.system_prompt.len(),
            user_chars = request.user_prompt.len(),
            "sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(stage, status = status.as_u16(), "completion request rejected");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message: error_excerpt(&text),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        let text = parsed.into_text()?;
        tracing::debug!(stage, chars = text.len(), "completion received");
        Ok(text)
    }

    fn transport_error(&self, error: &reqwest::Error) -> GenerationError {
        if error.is_timeout() {
            GenerationError::Timeout {
                after_ms: u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            GenerationError::Request(error.to_string())
        }
    }
}

#[async_trait]
impl GenerationService for ChatClient {
    async fn generate_content(
        &self,
        request: GenerationRequest,
    ) -> Result<String, GenerationError> {
        self.complete(request, "content").await
    }

    async fn describe_style(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.complete(request, "style").await
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

fn resolve_api_key(var: &str, value: Option<String>) -> Result<String, LlmClientError> {
    value
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| LlmClientError::MissingApiKey {
            var: var.to_string(),
        })
}
