//! Google Gemini provider (`generateContent`).
//!
//! Gemini has no system role. System messages are flattened into a preamble
//! prepended to the first user turn, and assistant turns are sent with the
//! `model` role.
//!
//! ## Security
//!
//! The API key is held in an [`ApiCredential`] and only exposed when the
//! `x-goog-api-key` header is built.

use super::{
    factory::{validate_base_url, ProviderFactory},
    http,
    secrets::ApiCredential,
    ChatMessage, ChatProvider, CompletionOptions, CompletionResponse, ContentPart, ProviderError,
    Role, TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Environment variable name for the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Gemini chat provider.
pub struct GeminiProvider {
    credential: ApiCredential,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    /// Create a provider with an explicit API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::explicit(api_key, "Gemini"),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from JSON settings (`api_key`, `model`, `base_url`), with the
    /// key falling back to `GEMINI_API_KEY`.
    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        let credential = ApiCredential::resolve(config, GEMINI_API_KEY_ENV, "Gemini")?;

        Ok(Self {
            credential,
            base_url: config["base_url"]
                .as_str()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config["model"].as_str().unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, PartialEq)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize, PartialEq)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

fn translate_part(part: ContentPart) -> GeminiPart {
    match part {
        ContentPart::Text { text } => GeminiPart::Text { text },
        ContentPart::Image { mime_type, data } => GeminiPart::InlineData {
            inline_data: InlineData { mime_type, data },
        },
    }
}

/// Translate the uniform conversation into Gemini `contents`.
fn translate_messages(messages: &[ChatMessage]) -> Vec<GeminiContent> {
    let preamble = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.text())
        .collect::<Vec<_>>()
        .join("\n\n");
    let mut preamble = (!preamble.is_empty()).then_some(preamble);

    let mut contents = Vec::with_capacity(messages.len());
    for message in messages.iter().filter(|m| m.role != Role::System) {
        let mut parts: Vec<GeminiPart> = message
            .content
            .to_parts()
            .into_iter()
            .map(translate_part)
            .collect();

        let role = match message.role {
            Role::Assistant => "model",
            _ => "user",
        };
        if role == "user" {
            if let Some(text) = preamble.take() {
                parts.insert(0, GeminiPart::Text { text });
            }
        }
        contents.push(GeminiContent { role, parts });
    }

    // Only system messages: send the preamble as the sole user turn.
    if let Some(text) = preamble {
        contents.insert(
            0,
            GeminiContent {
                role: "user",
                parts: vec![GeminiPart::Text { text }],
            },
        );
    }

    contents
}

fn build_request(messages: &[ChatMessage], options: &CompletionOptions) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: translate_messages(messages),
        generation_config: GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_output_tokens,
            response_mime_type: options.want_json.then_some("application/json"),
        },
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = build_request(messages, options);

        let response = http::client()
            .post(self.endpoint())
            .header("x-goog-api-key", self.credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(http::send_error)?;

        if !response.status().is_success() {
            return Err(http::error_from_response(response).await);
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;
        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        let usage = body
            .usage_metadata
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage,
            model: body.model_version.unwrap_or_else(|| self.model.clone()),
            stop_reason: candidate.finish_reason,
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Factory for Gemini providers.
///
/// ## Configuration Format
/// ```json
/// {
///   "api_key": "AIza...",          // Optional, falls back to GEMINI_API_KEY env
///   "model": "gemini-2.0-flash",   // Optional
///   "base_url": "https://..."      // Optional, custom API endpoint
/// }
/// ```
pub struct GeminiProviderFactory;

impl ProviderFactory for GeminiProviderFactory {
    fn provider_type(&self) -> &'static str {
        "gemini"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn ChatProvider>, ProviderError> {
        Ok(Arc::new(GeminiProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        ApiCredential::resolve(config, GEMINI_API_KEY_ENV, "Gemini")?;
        validate_base_url(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_flattened_into_first_user_turn() {
        let messages = vec![
            ChatMessage::system("You are an HSE engineer."),
            ChatMessage::system("Answer in JSON."),
            ChatMessage::user("Analyse step 1"),
            ChatMessage::assistant("{}"),
            ChatMessage::user("Again"),
        ];

        let contents = translate_messages(&messages);

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert_eq!(
            contents[0].parts[0],
            GeminiPart::Text {
                text: "You are an HSE engineer.\n\nAnswer in JSON.".to_string()
            }
        );
        assert_eq!(
            contents[0].parts[1],
            GeminiPart::Text {
                text: "Analyse step 1".to_string()
            }
        );
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].parts.len(), 1);
    }

    #[test]
    fn test_images_become_inline_data() {
        let messages = vec![ChatMessage::user_parts(vec![
            ContentPart::text("Photo of step 2"),
            ContentPart::image("image/jpeg", "aGVsbG8="),
        ])];

        let contents = translate_messages(&messages);
        let value = serde_json::to_value(&contents[0]).unwrap();

        assert_eq!(value["parts"][0]["text"], "Photo of step 2");
        assert_eq!(value["parts"][1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(value["parts"][1]["inline_data"]["data"], "aGVsbG8=");
    }

    #[test]
    fn test_system_only_conversation() {
        let contents = translate_messages(&[ChatMessage::system("Only instructions")]);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role, "user");
    }

    #[test]
    fn test_request_json_mode() {
        let options = CompletionOptions {
            temperature: 0.2,
            max_output_tokens: 3072,
            want_json: true,
        };
        let request = build_request(&[ChatMessage::user("hi")], &options);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 3072);

        let plain = build_request(&[ChatMessage::user("hi")], &CompletionOptions::default());
        let value = serde_json::to_value(&plain).unwrap();
        assert!(value["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_endpoint_includes_model() {
        let provider = GeminiProvider::new("key")
            .with_model("gemini-1.5-pro")
            .with_base_url("http://localhost:8080");
        assert_eq!(
            provider.endpoint(),
            "http://localhost:8080/models/gemini-1.5-pro:generateContent"
        );
        assert_eq!(provider.model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "{\"steps\""}, {"text": ": []}"}], "role": "model"}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 40, "totalTokenCount": 160},
            "modelVersion": "gemini-2.0-flash-001"
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.usage_metadata.unwrap().prompt_token_count, 120);
    }

    #[test]
    fn test_factory_create_with_api_key() {
        let factory = GeminiProviderFactory;
        let config = serde_json::json!({ "api_key": "test-key", "model": "gemini-2.0-flash" });
        let provider = factory.create(&config).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_factory_validate_invalid_base_url() {
        let factory = GeminiProviderFactory;
        let config = serde_json::json!({ "api_key": "test-key", "base_url": "invalid-url" });
        assert!(factory.validate_config(&config).is_err());
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let secret_key = "AIza-super-secret-key-12345";
        let provider = GeminiProvider::new(secret_key);
        let debug_output = format!("{:?}", provider);

        assert!(
            !debug_output.contains(secret_key),
            "API key was exposed in Debug output!"
        );
        assert!(debug_output.contains("[REDACTED]"));
    }

}
