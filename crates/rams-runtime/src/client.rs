//! LLM client with single-step failover.
//!
//! The client holds at most two providers. The primary is tried first; a
//! quota or rate-limit rejection moves the request to the secondary exactly
//! once. Every other failure, and any failure of the secondary, goes back to
//! the caller. There are no retries and no parallel fan-out.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{LlmClientConfig, ProviderSettings, DEFAULT_TIMEOUT};
use crate::providers::{
    ChatMessage, ChatProvider, CompletionOptions, ProviderError, ProviderRegistry, TokenUsage,
};

/// Errors surfaced by [`LlmClient::send`].
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No LLM provider configured")]
    NotConfigured,

    #[error("Provider '{provider}' unavailable: {source}")]
    ProviderUnavailable {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("Provider '{provider}' quota exceeded: {source}")]
    QuotaExceeded {
        provider: String,
        #[source]
        source: ProviderError,
    },
}

impl ClientError {
    fn from_provider(provider: &str, source: ProviderError) -> Self {
        let provider = provider.to_string();
        if source.is_quota() {
            ClientError::QuotaExceeded { provider, source }
        } else {
            ClientError::ProviderUnavailable { provider, source }
        }
    }

    /// Name of the provider that failed last, if any was called.
    pub fn provider(&self) -> Option<&str> {
        match self {
            ClientError::NotConfigured => None,
            ClientError::ProviderUnavailable { provider, .. }
            | ClientError::QuotaExceeded { provider, .. } => Some(provider),
        }
    }
}

/// A successful completion and where it came from.
#[derive(Debug, Clone)]
pub struct LlmReply {
    pub text: String,
    pub provider_used: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// Chat client over a primary and an optional secondary provider.
#[derive(Clone)]
pub struct LlmClient {
    primary: Option<Arc<dyn ChatProvider>>,
    secondary: Option<Arc<dyn ChatProvider>>,
    timeout: Duration,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("primary", &self.primary.as_ref().map(|p| p.name().to_string()))
            .field(
                "secondary",
                &self.secondary.as_ref().map(|p| p.name().to_string()),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmClient {
    pub fn new(
        primary: Option<Arc<dyn ChatProvider>>,
        secondary: Option<Arc<dyn ChatProvider>>,
    ) -> Self {
        Self {
            primary,
            secondary,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build both provider slots from configuration through the registry.
    ///
    /// Each slot's settings are validated by its factory first, so a bad
    /// `base_url` or a missing key fails here rather than on every call.
    pub fn from_config(
        config: &LlmClientConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, ProviderError> {
        let build = |slot: &Option<ProviderSettings>| {
            slot.as_ref()
                .map(|settings| registry.create(&settings.provider_type, &settings.to_json()))
                .transpose()
        };

        Ok(Self {
            primary: build(&config.primary)?,
            secondary: build(&config.secondary)?,
            timeout: config.timeout,
        })
    }

    /// Whether at least one provider is available.
    pub fn is_configured(&self) -> bool {
        self.primary.is_some() || self.secondary.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a conversation, failing over to the secondary on quota errors.
    pub async fn send(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<LlmReply, ClientError> {
        let (first, fallback) = match (&self.primary, &self.secondary) {
            (Some(primary), secondary) => (primary, secondary.as_ref()),
            (None, Some(secondary)) => (secondary, None),
            (None, None) => return Err(ClientError::NotConfigured),
        };

        tracing::debug!(
            provider = first.name(),
            model = first.model(),
            max_output_tokens = options.max_output_tokens,
            "Sending completion request"
        );

        let err = match self.call(first.as_ref(), messages, options).await {
            Ok(reply) => return Ok(reply),
            Err(err) => err,
        };

        match fallback {
            Some(secondary) if err.is_quota() => {
                tracing::warn!(
                    provider = first.name(),
                    fallback = secondary.name(),
                    error = %err,
                    "Quota exceeded on primary provider, failing over"
                );
                self.call(secondary.as_ref(), messages, options)
                    .await
                    .map_err(|e| ClientError::from_provider(secondary.name(), e))
            }
            _ => Err(ClientError::from_provider(first.name(), err)),
        }
    }

    async fn call(
        &self,
        provider: &dyn ChatProvider,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<LlmReply, ProviderError> {
        let response = tokio::time::timeout(self.timeout, provider.complete(messages, options))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))??;

        Ok(LlmReply {
            text: response.content,
            provider_used: provider.name().to_string(),
            model: response.model,
            usage: response.usage,
        })
    }
}
