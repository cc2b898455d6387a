//! LLM-assisted hazard extraction.
//!
//! One prompt, one client call (plus the client's own single failover), one
//! parse, one validation. Any failure is returned to the engine, which owns
//! the deterministic fallback.

mod validator;

pub use validator::validate_register;

use serde_json::Value as JsonValue;
use thiserror::Error;

use rams_core::{ProcedureMetadata, RiskAssessment, Step};

use crate::client::{ClientError, LlmClient};
use crate::parser::{parse_json, MalformedOutput};
use crate::prompts::build_extraction_messages;
use crate::providers::CompletionOptions;

/// Output tokens reserved regardless of step count.
pub const BASE_OUTPUT_TOKENS: u32 = 1024;

/// Additional output tokens per step.
pub const OUTPUT_TOKENS_PER_STEP: u32 = 512;

/// Hard cap on the output-token budget.
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

/// Output-token budget for a procedure of `step_count` steps.
pub fn output_token_budget(step_count: usize) -> u32 {
    let steps = u32::try_from(step_count).unwrap_or(u32::MAX);
    BASE_OUTPUT_TOKENS
        .saturating_add(OUTPUT_TOKENS_PER_STEP.saturating_mul(steps))
        .min(MAX_OUTPUT_TOKENS)
}

/// Errors from the extraction pipeline.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{source} (provider: {provider})")]
    MalformedOutput {
        provider: String,
        #[source]
        source: MalformedOutput,
    },

    #[error("Register from {provider} failed validation: {}", .errors.join("; "))]
    SchemaViolation {
        provider: String,
        errors: Vec<String>,
    },
}

impl ExtractionError {
    /// Short error class for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Client(ClientError::NotConfigured) => "not_configured",
            ExtractionError::Client(ClientError::QuotaExceeded { .. }) => "quota_exceeded",
            ExtractionError::Client(ClientError::ProviderUnavailable { .. }) => {
                "provider_unavailable"
            }
            ExtractionError::MalformedOutput { .. } => "malformed_output",
            ExtractionError::SchemaViolation { .. } => "schema_violation",
        }
    }

    /// Provider involved in the failure, if one was reached.
    pub fn provider(&self) -> Option<&str> {
        match self {
            ExtractionError::Client(e) => e.provider(),
            ExtractionError::MalformedOutput { provider, .. }
            | ExtractionError::SchemaViolation { provider, .. } => Some(provider),
        }
    }
}

/// A validated register and the provider that produced it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub assessment: RiskAssessment,
    pub provider: String,
    pub model: String,
}

/// Extracts hazard registers through an [`LlmClient`].
#[derive(Debug, Clone)]
pub struct HazardExtractor {
    client: LlmClient,
    temperature: f32,
}

impl HazardExtractor {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            temperature: crate::config::DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    /// Run the extraction for a procedure.
    pub async fn extract(
        &self,
        procedure: &ProcedureMetadata,
        steps: &[Step],
    ) -> Result<Extraction, ExtractionError> {
        let messages = build_extraction_messages(procedure, steps);
        let options = CompletionOptions {
            temperature: self.temperature,
            max_output_tokens: output_token_budget(steps.len()),
            want_json: true,
        };

        tracing::debug!(
            steps = steps.len(),
            prompt_chars = messages.iter().map(|m| m.content.text().len()).sum::<usize>(),
            max_output_tokens = options.max_output_tokens,
            "Requesting hazard extraction"
        );

        let reply = self.client.send(&messages, &options).await?;
        let provider = reply.provider_used;

        let object = parse_json(&reply.text).map_err(|source| ExtractionError::MalformedOutput {
            provider: provider.clone(),
            source,
        })?;

        let assessment = validate_register(&JsonValue::Object(object), steps).map_err(|errors| {
            ExtractionError::SchemaViolation {
                provider: provider.clone(),
                errors,
            }
        })?;

        tracing::debug!(
            provider = %provider,
            prompt_tokens = reply.usage.prompt_tokens,
            completion_tokens = reply.usage.completion_tokens,
            hazards = assessment.global.total_hazard_count,
            "Hazard extraction validated"
        );

        Ok(Extraction {
            assessment,
            provider,
            model: reply.model,
        })
    }
}
