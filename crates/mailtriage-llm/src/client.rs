//! HTTP client for OpenAI-compatible chat completion services.

use crate::backend::CompletionBackend;
use crate::error::{LlmError, LlmResult};
use crate::types::*;
use async_trait::async_trait;
use mailtriage_config::ClassifierConfig;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, warn};

/// Initial delay before the first retry; doubled on every further attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Client for a chat-completions endpoint.
///
/// Build it once at startup and share it behind an `Arc`.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    timeout: Duration,
    max_retries: u32,
}

impl ChatClient {
    /// Create a new client from configuration, reading the API key from the environment.
    pub fn from_config(config: &ClassifierConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key()
            .map_err(|e| LlmError::InvalidConfig(e.to_string()))?;

        Self::new(
            &config.base_url,
            api_key,
            &config.model,
            Duration::from_secs(config.timeout_seconds),
        )
        .map(|client| client.with_max_retries(config.max_retries))
    }

    /// Create a new client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> LlmResult<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(LlmError::InvalidConfig("base URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            timeout,
            max_retries: 0,
        })
    }

    /// Retry transient failures up to `max_retries` extra times.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether the service answers an authenticated model listing.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Send a single chat request without retrying.
    pub async fn chat(&self, request: &ChatRequest) -> LlmResult<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            "Requesting completion from {} with model {}",
            url, request.model
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &text, &request.model));
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response)
    }

    /// Send a chat request, retrying transient failures with exponential backoff.
    pub async fn chat_with_retry(&self, request: &ChatRequest) -> LlmResult<ChatResponse> {
        let mut attempt = 0;
        loop {
            match self.chat(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
                    attempt += 1;
                    warn!(
                        "Transient classification failure ({}), retry {}/{} in {:?}",
                        e, attempt, self.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_connect() {
            LlmError::ServerUnreachable {
                host: self.base_url.clone(),
            }
        } else if e.is_timeout() {
            LlmError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            LlmError::Http(e)
        }
    }
}

/// Turn a non-success status and its body into a typed error.
fn map_status_error(status: StatusCode, body: &str, model: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status.as_u16() {
        401 | 403 => LlmError::Unauthorized {
            status: status.as_u16(),
        },
        429 => LlmError::RateLimited { message },
        404 if message.contains("model") => LlmError::ModelNotFound {
            model: model.to_string(),
        },
        code => LlmError::ApiError {
            status: code,
            message,
        },
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        let chat_request = ChatRequest::new(&self.model)
            .with_message(ChatMessage::system(&request.system))
            .with_message(ChatMessage::user(&request.prompt))
            .with_max_tokens(request.max_tokens)
            .with_temperature(request.temperature);

        let response = self.chat_with_retry(&chat_request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse { task: request.task })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
