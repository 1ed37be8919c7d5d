//! Completion-service client
//!
//! Two uses: suggested normalization factors, and commentary on one record or
//! on the whole history. Every call is a single attempt and never fails
//! outward. Errors are logged and replaced by default factors or by
//! [`InsightText::fallback`].

mod prompt;
mod transport;

pub use prompt::{history_prompt, parse_factor_suggestion, sample_prompt, FACTOR_PROMPT};
pub use transport::{CompletionRequest, CompletionTransport, HttpCompletionTransport};

use crate::config::{ApiKey, InsightConfig};
use crate::error::InsightServiceError;
use qnet_types::{Distribution, InsightText, MetricSample, NormalizationFactors, StoredRecord};
use std::sync::Arc;

/// Returned by `summarize_history` when there is nothing to analyze.
pub const EMPTY_HISTORY: &str = "No network records available for analysis.";

/// Client for the text-completion service.
#[derive(Clone)]
pub struct InsightClient {
    transport: Arc<dyn CompletionTransport>,
    model: String,
    max_tokens: u32,
}

impl std::fmt::Debug for InsightClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightClient")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl InsightClient {
    /// HTTP client against the configured endpoint.
    pub fn new(config: &InsightConfig, api_key: ApiKey) -> Result<Self, InsightServiceError> {
        let transport = HttpCompletionTransport::new(&config.endpoint, api_key, config.timeout())?;
        Ok(Self::with_transport(
            Arc::new(transport),
            &config.model,
            config.max_tokens,
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn CompletionTransport>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            transport,
            model: model.into(),
            max_tokens,
        }
    }

    /// Ask the service for normalization factors.
    ///
    /// Any factor the response does not name falls back to 100; a failed
    /// request yields the all-default set.
    pub async fn suggest_normalization_factors(&self) -> NormalizationFactors {
        match self.complete(FACTOR_PROMPT.to_string()).await {
            Ok(text) => {
                let (factors, defaulted) = parse_factor_suggestion(&text);
                if !defaulted.is_empty() {
                    tracing::debug!(?defaulted, "Suggestion omitted factors, using defaults");
                }
                tracing::info!(%factors, "Using suggested normalization factors");
                factors
            }
            Err(e) => {
                tracing::warn!(error = %e, "Factor suggestion failed, using defaults");
                NormalizationFactors::default()
            }
        }
    }

    /// Commentary on a single measurement.
    pub async fn summarize(&self, sample: &MetricSample, distribution: &Distribution) -> InsightText {
        self.analysis(sample_prompt(sample, distribution)).await
    }

    /// Commentary on a batch of stored records.
    pub async fn summarize_history(&self, records: &[StoredRecord]) -> InsightText {
        if records.is_empty() {
            return InsightText::new(EMPTY_HISTORY);
        }
        self.analysis(history_prompt(records)).await
    }

    async fn analysis(&self, prompt: String) -> InsightText {
        match self.complete(prompt).await {
            Ok(text) => InsightText::new(text),
            Err(e) => {
                tracing::warn!(error = %e, "Analysis request failed");
                InsightText::fallback()
            }
        }
    }

    async fn complete(&self, prompt: String) -> Result<String, InsightServiceError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            prompt,
            max_tokens: self.max_tokens,
        };
        let text = self.transport.complete(&request).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(InsightServiceError::Malformed("empty completion".to_string()));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport shared by the insight and pipeline tests.

    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<String, InsightServiceError>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Result<String, InsightServiceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionTransport for ScriptedTransport {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<String, InsightServiceError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("Connection looks stable.".to_string()))
        }
    }
}
