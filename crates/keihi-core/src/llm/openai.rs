//! OpenAI-compatible chat completions provider.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, with_retry, ContentPart, ModelClient};
use crate::error::ModelError;
use crate::models::config::ModelConfig;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Client for `/chat/completions` on OpenAI or a compatible server.
pub struct OpenAiClient {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    max_output_tokens: u32,
    max_retries: usize,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<MessagePart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessagePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

impl OpenAiClient {
    /// Create a new OpenAI-compatible client.
    pub fn new(config: &ModelConfig, api_key: SecretString) -> Result<Self, ModelError> {
        Ok(Self {
            client: http_client(config)?,
            api_key,
            model: config.model_name().to_string(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_API_URL.to_string()),
            max_output_tokens: config.max_output_tokens,
            max_retries: config.max_retries,
        })
    }

    fn build_request(&self, parts: &[ContentPart]) -> ChatRequest {
        let content = parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => MessagePart::Text { text: text.clone() },
                ContentPart::InlineData { mime_type, data } => MessagePart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{};base64,{}", mime_type, data),
                    },
                },
            })
            .collect();

        ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_output_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, ModelError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<String, ModelError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::MalformedResponse("No choices returned".to_string()))?;

    match (choice.message.content, choice.finish_reason.as_deref()) {
        (Some(content), _) => Ok(content),
        // A normal stop with nothing to say is an empty answer
        (None, Some("stop")) => Ok(String::new()),
        (None, reason) => Err(ModelError::MalformedResponse(format!(
            "No message content returned (finish reason: {})",
            reason.unwrap_or("unknown")
        ))),
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn invoke(&self, parts: &[ContentPart]) -> Result<String, ModelError> {
        let request = self.build_request(parts);
        debug!(model = %self.model, parts = parts.len(), "Sending chat completion request");

        let this = self;
        let request = &request;
        with_retry(self.max_retries, move || this.send(request)).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
