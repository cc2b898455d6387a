//! OpenAI chat completions provider.
//!
//! Also usable against any OpenAI-compatible endpoint through `base_url`.

use super::{
    factory::{validate_base_url, ProviderFactory},
    http,
    secrets::ApiCredential,
    ChatMessage, ChatProvider, CompletionOptions, CompletionResponse, ContentPart, MessageContent,
    ProviderError, Role, TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Environment variable name for the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat provider.
pub struct OpenAiProvider {
    credential: ApiCredential,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::explicit(api_key, "OpenAI"),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from JSON settings (`api_key`, `model`, `base_url`), with the
    /// key falling back to `OPENAI_API_KEY`.
    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        let credential = ApiCredential::resolve(config, OPENAI_API_KEY_ENV, "OpenAI")?;

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
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: OpenAiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    type_: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn translate_message(message: &ChatMessage) -> OpenAiMessage {
    let content = match &message.content {
        MessageContent::Text(text) => OpenAiContent::Text(text.clone()),
        MessageContent::Parts(parts) => OpenAiContent::Parts(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => OpenAiPart::Text { text: text.clone() },
                    ContentPart::Image { mime_type, data } => OpenAiPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{};base64,{}", mime_type, data),
                        },
                    },
                })
                .collect(),
        ),
    };

    OpenAiMessage {
        role: role_name(message.role),
        content,
    }
}

fn build_request(
    model: &str,
    messages: &[ChatMessage],
    options: &CompletionOptions,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: messages.iter().map(translate_message).collect(),
        temperature: options.temperature,
        max_tokens: options.max_output_tokens,
        response_format: options.want_json.then_some(ResponseFormat {
            type_: "json_object",
        }),
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = build_request(&self.model, messages, options);

        let response = http::client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(http::send_error)?;

        if !response.status().is_success() {
            return Err(http::error_from_response(response).await);
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;
        let content = choice
            .message
            .content
            .filter(|c| !c.is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        let usage = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage,
            model: body.model.unwrap_or_else(|| self.model.clone()),
            stop_reason: choice.finish_reason,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Factory for OpenAI providers.
///
/// ## Configuration Format
/// ```json
/// {
///   "api_key": "sk-...",           // Optional, falls back to OPENAI_API_KEY env
///   "model": "gpt-4o-mini",        // Optional
///   "base_url": "https://..."      // Optional, OpenAI-compatible endpoint
/// }
/// ```
pub struct OpenAiProviderFactory;

impl ProviderFactory for OpenAiProviderFactory {
    fn provider_type(&self) -> &'static str {
        "openai"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn ChatProvider>, ProviderError> {
        Ok(Arc::new(OpenAiProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        ApiCredential::resolve(config, OPENAI_API_KEY_ENV, "OpenAI")?;
        validate_base_url(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_role_is_native() {
        let request = build_request(
            "gpt-4o-mini",
            &[
                ChatMessage::system("You are an HSE engineer."),
                ChatMessage::user("Analyse"),
            ],
            &CompletionOptions::default(),
        );
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "You are an HSE engineer.");
        assert_eq!(value["messages"][1]["role"], "user");
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_images_become_data_urls() {
        let message = ChatMessage::user_parts(vec![
            ContentPart::text("Photo"),
            ContentPart::image("image/png", "iVBORw0="),
        ]);
        let value = serde_json::to_value(translate_message(&message)).unwrap();

        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][0]["text"], "Photo");
        assert_eq!(value["content"][1]["type"], "image_url");
        assert_eq!(
            value["content"][1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0="
        );
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let options = CompletionOptions {
            want_json: true,
            ..Default::default()
        };
        let request = build_request("gpt-4o-mini", &[ChatMessage::user("hi")], &options);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["max_tokens"], 2048);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{}"));
        assert_eq!(parsed.usage.unwrap().completion_tokens, 2);
    }

    #[test]
    fn test_factory_create_with_api_key() {
        let factory = OpenAiProviderFactory;
        let provider = factory
            .create(&serde_json::json!({ "api_key": "sk-test", "model": "gpt-4o" }))
            .unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn test_factory_validate_invalid_base_url() {
        let factory = OpenAiProviderFactory;
        let config = serde_json::json!({ "api_key": "sk-test", "base_url": "localhost:8080" });
        assert!(factory.validate_config(&config).is_err());
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let secret_key = "sk-super-secret-key-12345";
        let provider = OpenAiProvider::new(secret_key);
        let debug_output = format!("{:?}", provider);

        assert!(!debug_output.contains(secret_key));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
