//! Chat-completion client.
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint. Every call goes through
//! [`retry_with_backoff`], so transient failures and slow attempts are retried with backoff and
//! only the final outcome reaches the caller.

use crate::config::CompletionSettings;
use crate::constants::SYSTEM_PROMPT;
use crate::error::{CompletionError, CompletionResult};
use crate::retry::{retry_with_backoff, RetryError, Retryable};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Turns a composed prompt into model output.
pub trait Completion: Send + Sync {
    fn complete(&self, prompt: &str) -> impl Future<Output = CompletionResult<String>> + Send;
}

impl Retryable for CompletionError {
    fn is_retryable(&self) -> bool {
        !matches!(
            self,
            CompletionError::MissingApiKey
                | CompletionError::Unauthorized { .. }
                | CompletionError::InvalidUrl(_)
        )
    }
}

impl From<RetryError<CompletionError>> for CompletionError {
    fn from(err: RetryError<CompletionError>) -> Self {
        match err {
            RetryError::TimedOut { attempts, timeout } => {
                CompletionError::Timeout { attempts, timeout }
            }
            RetryError::Failed { error, .. } => error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// HTTP client for the chat-completion service.
#[derive(Clone, Debug)]
pub struct ChatClient {
    http: Client,
    settings: CompletionSettings,
}

impl ChatClient {
    pub fn new(http: Client, settings: CompletionSettings) -> Self {
        Self { http, settings }
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    fn endpoint(&self) -> CompletionResult<Url> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CompletionError::InvalidUrl(self.settings.base_url.to_string()))?
            .pop_if_empty()
            .extend(["chat", "completions"]);
        Ok(url)
    }

    fn request<'a>(&'a self, prompt: &str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompt.into(),
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            frequency_penalty: self.settings.frequency_penalty,
            presence_penalty: self.settings.presence_penalty,
        }
    }

    /// One delivery attempt, without retry.
    async fn send_once(
        &self,
        url: &Url,
        api_key: &str,
        request: &ChatCompletionRequest<'_>,
    ) -> CompletionResult<String> {
        let response = self
            .http
            .post(url.clone())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CompletionError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
        let text = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(text)
    }
}

impl Completion for ChatClient {
    async fn complete(&self, prompt: &str) -> CompletionResult<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)?;
        let url = self.endpoint()?;
        let request = self.request(prompt);

        tracing::debug!(model = %self.settings.model, "sending completion request to {url}");

        let (url, request) = (&url, &request);
        let attempt_timeout = self.settings.retry.attempt_timeout;
        retry_with_backoff(&self.settings.retry, move |attempt| {
            tracing::debug!(attempt, "completion attempt");
            self.send_once(url, api_key, request)
        })
        .await
        .map_err(|err| match err {
            // HTTP client timeouts (connect or read) end the attempt before the retry bound does.
            RetryError::Failed {
                attempts,
                error: CompletionError::Transport(e),
            } if e.is_timeout() => CompletionError::Timeout {
                attempts,
                timeout: attempt_timeout,
            },
            other => other.into(),
        })
    }
}
