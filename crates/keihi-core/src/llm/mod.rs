//! Model provider abstraction.
//!
//! The pipeline only needs one capability from a provider: send an ordered
//! list of content parts, get plain text back. Any API exposing that shape
//! can implement [`ModelClient`].
//!
//! # Supported Providers
//!
//! - **Gemini** - Google Generative Language `generateContent`
//! - **OpenAI** - any OpenAI-compatible `/chat/completions` endpoint

mod gemini;
mod openai;
#[cfg(test)]
pub(crate) mod testing;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use secrecy::SecretString;
use tracing::warn;

use crate::error::ModelError;
use crate::models::config::{ModelConfig, ProviderKind};
use crate::models::file::NormalizedFile;

/// One element of a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Instruction or inlined document text.
    Text(String),
    /// Binary attachment, base64 encoded.
    InlineData { mime_type: String, data: String },
}

/// A multimodal model that answers in plain text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one request and return the raw text answer.
    async fn invoke(&self, parts: &[ContentPart]) -> Result<String, ModelError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Pair the file content with an instruction.
///
/// Images travel as an attachment after the instruction; documents are
/// inlined in triple quotes ahead of it.
pub fn content_parts(file: &NormalizedFile, instruction: &str) -> Vec<ContentPart> {
    match file {
        NormalizedFile::Image {
            mime_type,
            base64_data,
            ..
        } => vec![
            ContentPart::Text(instruction.to_string()),
            ContentPart::InlineData {
                mime_type: mime_type.clone(),
                data: base64_data.clone(),
            },
        ],
        NormalizedFile::Document { text, .. } => {
            vec![ContentPart::Text(format!("\"\"\"{}\"\"\"\n{}", text, instruction))]
        }
    }
}

/// Send a request and return its trimmed answer.
pub async fn ask(
    client: &dyn ModelClient,
    file: &NormalizedFile,
    instruction: &str,
) -> Result<String, ModelError> {
    let parts = content_parts(file, instruction);
    let answer = client.invoke(&parts).await?;
    Ok(answer.trim().to_string())
}

/// Build the configured provider client, once per process.
pub fn create_client(config: &ModelConfig) -> Result<Arc<dyn ModelClient>, ModelError> {
    let variable = config.api_key_env();
    let api_key = std::env::var(variable).map_err(|_| {
        ModelError::Config(format!(
            "API key not found. Set the {} environment variable.",
            variable
        ))
    })?;
    let api_key = SecretString::new(api_key);

    let client: Arc<dyn ModelClient> = match config.provider {
        ProviderKind::Gemini => Arc::new(GeminiClient::new(config, api_key)?),
        ProviderKind::Openai => Arc::new(OpenAiClient::new(config, api_key)?),
    };
    Ok(client)
}

pub(crate) fn http_client(config: &ModelConfig) -> Result<reqwest::Client, ModelError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ModelError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Run `request`, retrying transient failures with exponential backoff.
pub(crate) async fn with_retry<T, F, Fut>(max_retries: usize, request: F) -> Result<T, ModelError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ModelError>>,
{
    request
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_times(max_retries),
        )
        .when(ModelError::is_retryable)
        .notify(|err, delay| warn!("Model request failed ({}), retrying in {:?}", err, delay))
        .await
}
