//! Provider construction by type name.
//!
//! Engine configuration names each provider slot by `type` (`gemini`,
//! `openai`). The [`ProviderRegistry`] maps that name to a
//! [`ProviderFactory`], checks the slot's settings, then builds the provider.
//! Tests register their own factories the same way.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{ChatProvider, ProviderError};

/// Builds one kind of provider from its JSON settings.
pub trait ProviderFactory: Send + Sync {
    /// The `type` this factory answers to.
    fn provider_type(&self) -> &'static str;

    /// Reject settings that could never produce a working provider.
    fn validate_config(&self, settings: &JsonValue) -> Result<(), ProviderError>;

    fn create(&self, settings: &JsonValue) -> Result<Arc<dyn ChatProvider>, ProviderError>;
}

/// Factories keyed by provider type.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<&'static str, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every vendor compiled into this build.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "gemini")]
        registry.register(Arc::new(super::GeminiProviderFactory));
        #[cfg(feature = "openai")]
        registry.register(Arc::new(super::OpenAiProviderFactory));
        registry
    }

    /// Add a factory. A later factory for the same type replaces the earlier one.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories.insert(factory.provider_type(), factory);
    }

    /// Validate `settings` with the factory for `provider_type`, then build.
    pub fn create(
        &self,
        provider_type: &str,
        settings: &JsonValue,
    ) -> Result<Arc<dyn ChatProvider>, ProviderError> {
        let factory = self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider type '{}' (available: {})",
                provider_type,
                self.available_types().join(", ")
            ))
        })?;

        factory.validate_config(settings).map_err(|e| match e {
            ProviderError::NotConfigured(reason) => ProviderError::NotConfigured(format!(
                "Invalid '{}' settings: {}",
                provider_type, reason
            )),
            other => other,
        })?;
        factory.create(settings)
    }

    pub fn available_types(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("types", &self.available_types())
            .finish()
    }
}

/// An optional `base_url` setting must be an http(s) URL.
pub(crate) fn validate_base_url(settings: &JsonValue) -> Result<(), ProviderError> {
    match settings["base_url"].as_str() {
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            Err(ProviderError::NotConfigured(format!(
                "base_url '{}' must start with http:// or https://",
                url
            )))
        }
        _ => Ok(()),
    }
}
