//! API keys for chat providers.
//!
//! A key is wrapped in [`ApiCredential`] the moment it is read from provider
//! settings or the environment. `Debug` and `Display` never print it; the
//! value leaves the wrapper only through [`ApiCredential::expose`] when the
//! request header is set.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Settings key holding an inline API key.
pub const API_KEY_SETTING: &str = "api_key";

/// Where a key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Inline `api_key` in the provider settings
    Settings,
    /// The named environment variable
    Environment(&'static str),
    /// Passed to a provider constructor
    Explicit,
}

impl fmt::Display for KeyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyOrigin::Settings => f.write_str("settings"),
            KeyOrigin::Environment(var) => write!(f, "${}", var),
            KeyOrigin::Explicit => f.write_str("explicit"),
        }
    }
}

/// A vendor API key, zeroed on drop and redacted when formatted.
pub struct ApiCredential {
    key: SecretString,
    origin: KeyOrigin,
    vendor: &'static str,
}

impl ApiCredential {
    pub fn explicit(key: impl Into<String>, vendor: &'static str) -> Self {
        Self {
            key: SecretString::from(key.into()),
            origin: KeyOrigin::Explicit,
            vendor,
        }
    }

    /// Read the key from `api_key` in `settings`, else from `env_var`.
    ///
    /// Blank values count as missing.
    pub fn resolve(
        settings: &JsonValue,
        env_var: &'static str,
        vendor: &'static str,
    ) -> Result<Self, ProviderError> {
        let inline = settings[API_KEY_SETTING]
            .as_str()
            .filter(|key| !key.trim().is_empty())
            .map(|key| (key.to_string(), KeyOrigin::Settings));
        let found = inline.or_else(|| {
            std::env::var(env_var)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(|key| (key, KeyOrigin::Environment(env_var)))
        });

        match found {
            Some((key, origin)) => Ok(Self {
                key: SecretString::from(key),
                origin,
                vendor,
            }),
            None => Err(ProviderError::NotConfigured(format!(
                "{} API key missing: set '{}' in the provider settings or {}",
                vendor, API_KEY_SETTING, env_var
            ))),
        }
    }

    /// Raw key, for the request header only.
    pub fn expose(&self) -> &str {
        self.key.expose_secret()
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("vendor", &self.vendor)
            .field("origin", &self.origin)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} key ({}) [REDACTED]", self.vendor, self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "sk-live-0123456789abcdef";

    #[test]
    fn test_formatting_never_shows_key() {
        let cred = ApiCredential::explicit(SECRET, "OpenAI");

        let debug = format!("{:?}", cred);
        let display = format!("{}", cred);
        assert!(!debug.contains(SECRET));
        assert!(!display.contains(SECRET));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(display, "OpenAI key (explicit) [REDACTED]");
        assert_eq!(cred.expose(), SECRET);
    }

    #[test]
    fn test_inline_key_wins_over_environment() {
        std::env::set_var("RAMS_TEST_KEY_INLINE", "from-env");
        let cred = ApiCredential::resolve(
            &json!({ "api_key": "from-settings" }),
            "RAMS_TEST_KEY_INLINE",
            "Gemini",
        )
        .unwrap();
        std::env::remove_var("RAMS_TEST_KEY_INLINE");

        assert_eq!(cred.expose(), "from-settings");
        assert_eq!(cred.origin, KeyOrigin::Settings);
    }

    #[test]
    fn test_environment_used_when_settings_blank() {
        std::env::set_var("RAMS_TEST_KEY_ENV", "from-env");
        let cred =
            ApiCredential::resolve(&json!({ "api_key": "  " }), "RAMS_TEST_KEY_ENV", "Gemini")
                .unwrap();
        std::env::remove_var("RAMS_TEST_KEY_ENV");

        assert_eq!(cred.expose(), "from-env");
        assert_eq!(cred.origin, KeyOrigin::Environment("RAMS_TEST_KEY_ENV"));
        assert!(cred.to_string().contains("$RAMS_TEST_KEY_ENV"));
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        let settings = json!({});
        let err = ApiCredential::resolve(&settings, "RAMS_TEST_KEY_UNSET", "OpenAI").unwrap_err();

        match err {
            ProviderError::NotConfigured(msg) => {
                assert!(msg.contains("OpenAI"));
                assert!(msg.contains("RAMS_TEST_KEY_UNSET"));
            }
            other => panic!("Expected NotConfigured, got {:?}", other),
        }
    }
}
