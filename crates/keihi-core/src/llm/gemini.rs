//! Google Gemini provider (Generative Language API).

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, with_retry, ContentPart, ModelClient};
use crate::error::ModelError;
use crate::models::config::ModelConfig;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    max_output_tokens: u32,
    max_retries: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(Blob),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: &ModelConfig, api_key: SecretString) -> Result<Self, ModelError> {
        Ok(Self {
            client: http_client(config)?,
            api_key,
            model: config.model_name().to_string(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_API_URL.to_string()),
            max_output_tokens: config.max_output_tokens,
            max_retries: config.max_retries,
        })
    }

    fn build_request(&self, parts: &[ContentPart]) -> GenerateRequest {
        let parts = parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => Part::Text(text.clone()),
                ContentPart::InlineData { mime_type, data } => Part::InlineData(Blob {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                }),
            })
            .collect();

        GenerateRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    async fn send(&self, request: &GenerateRequest) -> Result<String, ModelError> {
        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", self.api_key.expose_secret().as_str())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
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

/// Concatenate the text parts of the first candidate.
fn parse_response(body: &str) -> Result<String, ModelError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ModelError::MalformedResponse(format!(
            "Prompt blocked: {}",
            reason
        )));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::MalformedResponse("No candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    // A normal stop with nothing to say is an empty answer
    if text.is_empty() && candidate.finish_reason.as_deref() != Some("STOP") {
        return Err(ModelError::MalformedResponse(format!(
            "Candidate has no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn invoke(&self, parts: &[ContentPart]) -> Result<String, ModelError> {
        let request = self.build_request(parts);
        debug!(model = %self.model, parts = parts.len(), "Sending Gemini request");

        let this = self;
        let request = &request;
        with_retry(self.max_retries, move || this.send(request)).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> GeminiClient {
        GeminiClient::new(
            &ModelConfig::default(),
            SecretString::new("test-key".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = client().build_request(&[
            ContentPart::Text("発行された日付を抜き出して。".to_string()),
            ContentPart::InlineData {
                mime_type: "image/png".to_string(),
                data: "iVBORw0KGgo=".to_string(),
            },
        ]);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "発行された日付を抜き出して。" },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                    ]
                }],
                "generationConfig": { "maxOutputTokens": 2048 }
            })
        );
    }

    #[test]
    fn test_default_model() {
        assert_eq!(client().model_name(), "gemini-1.5-flash-latest");
    }

    #[test]
    fn test_parse_joins_text_parts() {
        let body = r#"{
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "サービス" }, { "text": "請求書\n" }] },
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(parse_response(body).unwrap(), "サービス請求書\n");
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let body = r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_empty_candidate() {
        let body = r#"{ "candidates": [{ "finishReason": "MAX_TOKENS" }] }"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_parse_silent_stop_is_empty_answer() {
        let body = r#"{ "candidates": [{ "content": { "role": "model", "parts": [] }, "finishReason": "STOP" }] }"#;
        assert_eq!(parse_response(body).unwrap(), "");

        let body = r#"{ "candidates": [{ "content": null, "finishReason": "STOP" }] }"#;
        assert_eq!(parse_response(body).unwrap(), "");
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_response("<html>502</html>"),
            Err(ModelError::MalformedResponse(_))
        ));
    }
}
