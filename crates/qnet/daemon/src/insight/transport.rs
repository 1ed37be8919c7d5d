//! Completion service transport

use crate::config::ApiKey;
use crate::error::InsightServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of one completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

/// One request, one completion text. Implementations make a single attempt.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InsightServiceError>;
}

/// HTTP transport for an OpenAI-style `/v1/completions` endpoint.
#[derive(Clone)]
pub struct HttpCompletionTransport {
    client: Client,
    endpoint: String,
    api_key: ApiKey,
}

impl std::fmt::Debug for HttpCompletionTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletionTransport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpCompletionTransport {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: ApiKey,
        timeout: Duration,
    ) -> Result<Self, InsightServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InsightServiceError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionTransport for HttpCompletionTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InsightServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| InsightServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InsightServiceError::Status {
                status,
                body: truncate(&body, 320),
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| InsightServiceError::Malformed(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or(InsightServiceError::EmptyChoices)?;

        Ok(choice.text)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}
