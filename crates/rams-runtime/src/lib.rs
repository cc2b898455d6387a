//! # rams-runtime
//!
//! LLM-assisted hazard extraction for the RAMS risk engine.
//!
//! This crate asks a hosted chat model to draft the hazard register and
//! falls back to the deterministic classifier in `rams-core` whenever the
//! model is unavailable or answers with something that does not validate.
//!
//! ## Important
//!
//! The fallback is mandatory. [`RiskEngine::compute_risk_assessment`] never
//! fails; the report's `source` says which path produced the register.
//!
//! Providers are compiled in through cargo features:
//! - `gemini`: Google Gemini `generateContent`
//! - `openai`: OpenAI chat completions
//! - `all-providers`: both
//!
//! ## Example
//!
//! ```rust,ignore
//! use rams_runtime::{EngineConfig, ProviderRegistry, RiskEngine};
//!
//! let config = EngineConfig::from_file("rams.yaml")?;
//! let engine = RiskEngine::from_config(&config, &ProviderRegistry::with_defaults())?;
//!
//! let report = engine.compute_risk_assessment(&procedure, &steps).await;
//! println!("{} hazards ({})", report.assessment.global.total_hazard_count, report.source);
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod extractor;
pub mod parser;
pub mod prompts;
pub mod providers;

pub use client::{ClientError, LlmClient, LlmReply};
pub use config::{ConfigError, EngineConfig, LlmClientConfig, ProviderSettings};
pub use engine::{AssessmentReport, AssessmentSource, RiskEngine, RiskEngineBuilder};
pub use extractor::{output_token_budget, Extraction, ExtractionError, HazardExtractor};
pub use parser::{parse_json, MalformedOutput};
pub use providers::{
    ChatMessage, ChatProvider, CompletionOptions, CompletionResponse, ContentPart, ProviderError,
    ProviderFactory, ProviderRegistry, Role, TokenUsage,
};
