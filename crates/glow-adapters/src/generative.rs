//! Generative assessment providers.
//!
//! Two wire shapes are supported: a vision-capable `messages` endpoint that
//! answers `{result: {response}}`, and an OpenAI-style chat completions
//! endpoint that answers `{choices: [{message: {content}}]}`.

use std::time::Duration;

use async_trait::async_trait;
use glow_core::{AssessmentPrompt, AssessmentProvider, ServiceError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;

/// Connection settings for one generative provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Name used in logs and reported as the assessment source.
    pub name: String,
    /// Full request URL.
    pub endpoint: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier, for endpoints that take one in the body.
    pub model: Option<String>,
    /// Completion length cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Transport timeout for one call.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Settings with a 30 s timeout, 2048 tokens and a low temperature.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: None,
            max_tokens: 2048,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Content<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Content<'a> {
    Text(&'a str),
    Parts(Vec<Part<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Part<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

fn text_messages(prompt: &AssessmentPrompt) -> Vec<Message<'_>> {
    vec![
        Message {
            role: "system",
            content: Content::Text(&prompt.system),
        },
        Message {
            role: "user",
            content: Content::Text(&prompt.user),
        },
    ]
}

/// Vision-capable provider speaking `{messages}` → `{result: {response}}`.
///
/// The front photo, when present, travels as an `image_url` part of the user
/// message.
#[derive(Debug)]
pub struct MessagesProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    result: Option<MessagesResult>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct MessagesResult {
    response: Option<String>,
}

impl MessagesProvider {
    /// Creates a provider for `config`.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: http::client(config.timeout),
            config,
        }
    }
}

#[async_trait]
impl AssessmentProvider for MessagesProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn complete(&self, prompt: &AssessmentPrompt) -> Result<String, ServiceError> {
        let key = http::require_key(&self.config.api_key, &self.config.name)?;
        let mut messages = text_messages(prompt);
        if let Some(image) = &prompt.image {
            messages[1].content = Content::Parts(vec![
                Part::Text { text: &prompt.user },
                Part::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_uri(),
                    },
                },
            ]);
        }
        let body = MessagesRequest {
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let request = self.client.post(&self.config.endpoint).bearer_auth(key);
        let response: MessagesResponse =
            http::post_json(request, &body, &self.config.name).await?;

        match response.result.and_then(|r| r.response) {
            Some(text) => {
                debug!("{} answered with {} chars", self.config.name, text.len());
                Ok(text)
            }
            None => Err(ServiceError::permanent(format!(
                "{} returned no response text (errors: {:?})",
                self.config.name, response.errors
            ))),
        }
    }
}

/// Text-only provider speaking the chat completions shape.
#[derive(Debug)]
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatCompletionsProvider {
    /// Creates a provider for `config`.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: http::client(config.timeout),
            config,
        }
    }
}

#[async_trait]
impl AssessmentProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn complete(&self, prompt: &AssessmentPrompt) -> Result<String, ServiceError> {
        let key = http::require_key(&self.config.api_key, &self.config.name)?;
        let body = ChatRequest {
            model: self.config.model.as_deref(),
            messages: text_messages(prompt),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let request = self.client.post(&self.config.endpoint).bearer_auth(key);
        let response: ChatResponse = http::post_json(request, &body, &self.config.name).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ServiceError::permanent(format!("{} returned no choices", self.config.name))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use glow_core::EncodedImage;

    fn prompt() -> AssessmentPrompt {
        AssessmentPrompt {
            system: "sys".into(),
            user: "usr".into(),
            image: Some(EncodedImage {
                base64: "QUJD".into(),
                mime_type: "image/jpeg".into(),
            }),
        }
    }

    #[test]
    fn test_text_messages_shape() {
        let p = prompt();
        let json = serde_json::to_value(text_messages(&p)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "usr"}
            ])
        );
    }

    #[test]
    fn test_image_part_shape() {
        let part = Part::ImageUrl {
            image_url: ImageUrl {
                url: prompt().image.unwrap().data_uri(),
            },
        };
        let json = serde_json::to_value(part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/jpeg;base64,QUJD");
    }

    #[test]
    fn test_chat_request_omits_missing_model() {
        let p = prompt();
        let body = ChatRequest {
            model: None,
            messages: text_messages(&p),
            max_tokens: 10,
            temperature: 0.5,
        };
        let json = serde_json::to_value(body).unwrap();
        assert!(json.get("model").is_none());
        assert_eq!(json["max_tokens"], 10);
    }
}
