//! Risk engine entry point.
//!
//! The engine prefers the LLM extractor and falls back to the deterministic
//! classifier on any extraction failure. The fallback is not optional:
//! [`RiskEngine::compute_risk_assessment`] always returns a usable register.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use rams_core::{ClassifierConfig, HazardClassifier, ProcedureMetadata, RiskAssessment, Step};

use crate::client::LlmClient;
use crate::config::{EngineConfig, DEFAULT_TEMPERATURE};
use crate::extractor::HazardExtractor;
use crate::providers::{ProviderError, ProviderRegistry};

/// Which path produced a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentSource {
    Ai,
    Deterministic,
}

impl AssessmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentSource::Ai => "ai",
            AssessmentSource::Deterministic => "deterministic",
        }
    }
}

impl fmt::Display for AssessmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's result envelope.
///
/// The timestamp lives here so the register itself stays byte-identical
/// across deterministic runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub assessment: RiskAssessment,
    pub source: AssessmentSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub computed_at: DateTime<Utc>,
}

impl AssessmentReport {
    fn deterministic(assessment: RiskAssessment) -> Self {
        Self {
            assessment,
            source: AssessmentSource::Deterministic,
            provider: None,
            computed_at: Utc::now(),
        }
    }
}

/// Risk assessment engine.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    classifier: HazardClassifier,
    extractor: Option<HazardExtractor>,
}

impl RiskEngine {
    /// Engine with both paths.
    pub fn new(client: LlmClient, classifier: ClassifierConfig) -> Self {
        Self {
            classifier: HazardClassifier::new(classifier),
            extractor: Some(HazardExtractor::new(client)),
        }
    }

    /// Engine that never calls an LLM.
    pub fn deterministic(classifier: ClassifierConfig) -> Self {
        Self {
            classifier: HazardClassifier::new(classifier),
            extractor: None,
        }
    }

    pub fn builder() -> RiskEngineBuilder {
        RiskEngineBuilder::new()
    }

    /// Build from configuration, creating providers through `registry`.
    ///
    /// With no provider section configured the engine is deterministic.
    pub fn from_config(
        config: &EngineConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, ProviderError> {
        let mut builder = Self::builder()
            .classifier(config.classifier.clone())
            .temperature(config.llm.temperature);
        if config.llm.has_providers() {
            builder = builder.client(LlmClient::from_config(&config.llm, registry)?);
        }
        Ok(builder.build())
    }

    /// Whether the LLM path is available.
    pub fn is_ai_enabled(&self) -> bool {
        self.extractor
            .as_ref()
            .is_some_and(|e| e.client().is_configured())
    }

    /// Deterministic classification only.
    pub fn classify(&self, procedure: &ProcedureMetadata, steps: &[Step]) -> RiskAssessment {
        self.classifier.classify(procedure, steps)
    }

    /// Compute the hazard register for a procedure.
    ///
    /// Never fails. Extraction errors are logged at `warn` and answered with
    /// the deterministic register, unmodified.
    pub async fn compute_risk_assessment(
        &self,
        procedure: &ProcedureMetadata,
        steps: &[Step],
    ) -> AssessmentReport {
        let extractor = match &self.extractor {
            Some(extractor) if !steps.is_empty() && extractor.client().is_configured() => {
                extractor
            }
            _ => {
                tracing::debug!(steps = steps.len(), "Using deterministic classifier");
                return AssessmentReport::deterministic(self.classify(procedure, steps));
            }
        };

        match extractor.extract(procedure, steps).await {
            Ok(extraction) => {
                tracing::info!(
                    source = "ai",
                    provider = %extraction.provider,
                    model = %extraction.model,
                    "Risk assessment computed"
                );
                AssessmentReport {
                    assessment: extraction.assessment,
                    source: AssessmentSource::Ai,
                    provider: Some(extraction.provider),
                    computed_at: Utc::now(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    provider = e.provider().unwrap_or("none"),
                    error_kind = e.kind(),
                    error = %e,
                    "AI extraction failed, falling back to deterministic classifier"
                );
                let report = AssessmentReport::deterministic(self.classify(procedure, steps));
                tracing::info!(source = "deterministic", "Risk assessment computed");
                report
            }
        }
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::deterministic(ClassifierConfig::default())
    }
}

/// Builder for [`RiskEngine`].
pub struct RiskEngineBuilder {
    client: Option<LlmClient>,
    classifier: ClassifierConfig,
    temperature: f32,
}

impl RiskEngineBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            classifier: ClassifierConfig::default(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Set the LLM client. Without one the engine is deterministic.
    pub fn client(mut self, client: LlmClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn classifier(mut self, config: ClassifierConfig) -> Self {
        self.classifier = config;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn build(self) -> RiskEngine {
        let temperature = self.temperature;
        RiskEngine {
            classifier: HazardClassifier::new(self.classifier),
            extractor: self
                .client
                .map(|client| HazardExtractor::new(client).with_temperature(temperature)),
        }
    }
}

impl Default for RiskEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
