//! Engine configuration.
//!
//! Provider availability is an explicit value passed to the engine, loaded
//! from YAML or JSON:
//!
//! ```yaml
//! llm:
//!   timeout: 25s
//!   temperature: 0.2
//!   primary:   { type: gemini, model: gemini-2.0-flash }
//!   secondary: { type: openai, model: gpt-4o-mini }
//! classifier:
//!   probability_reduction: 2
//! ```
//!
//! A missing `primary` or `secondary` section disables that slot.

use std::path::Path;
use std::time::Duration;

use rams_core::procedure::has_json_extension;
use rams_core::ClassifierConfig;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Default hard deadline for one provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// Default sampling temperature for extraction.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML config: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub llm: LlmClientConfig,
    pub classifier: ClassifierConfig,
}

/// LLM client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmClientConfig {
    pub primary: Option<ProviderSettings>,
    pub secondary: Option<ProviderSettings>,

    /// Per-call deadline, humantime syntax (`25s`, `1m`)
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    pub temperature: f32,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            primary: None,
            secondary: None,
            timeout: DEFAULT_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LlmClientConfig {
    /// Whether any provider slot is filled.
    pub fn has_providers(&self) -> bool {
        self.primary.is_some() || self.secondary.is_some()
    }
}

/// One provider slot: the registry type plus vendor settings.
///
/// Everything besides `type` (`model`, `api_key`, `base_url`, ...) is passed
/// through to the provider factory as JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderSettings {
    #[serde(rename = "type")]
    pub provider_type: String,

    #[serde(flatten)]
    pub options: Map<String, JsonValue>,
}

impl ProviderSettings {
    pub fn new(provider_type: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Settings as the JSON object handed to the factory.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.options.clone())
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

impl EngineConfig {
    /// Parse configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file; `.json` is parsed as JSON, anything
    /// else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if has_json_extension(path) {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.timeout.is_zero() {
            return Err(ConfigError::Invalid("llm.timeout must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}
