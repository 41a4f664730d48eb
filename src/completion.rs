//! Thin adapter over a text-completion HTTP API.

use crate::config::Config;
use crate::error::CompletionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model name, e.g. `text-davinci-003`
    pub model: String,
    /// Full prompt text
    pub prompt: String,
    /// Output token budget
    pub max_tokens: u32,
}

/// One choice in a completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Generated text. May be absent when the provider returns nothing.
    pub text: Option<String>,
}

/// A completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Provider-assigned completion identifier
    pub id: String,
    /// Generated choices, usually exactly one
    pub choices: Vec<Choice>,
}

impl Completion {
    /// Returns the first choice's text, treating whitespace-only output
    /// as absent.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.text.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

/// Seam for the external text-completion API.
///
/// The workflow only ever talks to this trait, so tests script responses
/// and production injects [`HttpCompletionClient`]. The client instance is
/// constructed explicitly at process start and passed in; there is no
/// module-level singleton.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Requests one completion. Billable on success.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError>;
}

#[async_trait]
impl<C: CompletionClient + ?Sized> CompletionClient for Arc<C> {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        (**self).complete(request).await
    }
}

/// `reqwest`-backed completion client speaking the `/completions` wire
/// format: request `{model, prompt, max_tokens}`, response `{id, choices}`.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl HttpCompletionClient {
    /// Builds a client from loaded configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        let response = self
            .http
            .post(format!("{}/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
