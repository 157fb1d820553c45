//! Configuration structures for the scanning pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the keihi pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeihiConfig {
    /// Model provider configuration.
    pub model: ModelConfig,

    /// File loading configuration.
    pub loader: LoaderConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Export configuration.
    pub export: ExportConfig,
}

/// Which model provider API to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Generative Language API.
    #[default]
    Gemini,
    /// Any OpenAI-compatible chat completions endpoint.
    Openai,
}

impl ProviderKind {
    /// Environment variable read for the API key when none is configured.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Openai => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash-latest",
            ProviderKind::Openai => "gpt-4o-mini",
        }
    }
}

/// Model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider API.
    pub provider: ProviderKind,

    /// Model name (empty = provider default).
    pub model: String,

    /// Override for the provider base URL.
    pub base_url: Option<String>,

    /// Environment variable holding the API key (empty = provider default).
    pub api_key_env: String,

    /// Upper bound on generated tokens per answer.
    pub max_output_tokens: u32,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries for timeouts, connection failures, 429 and 5xx.
    pub max_retries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: String::new(),
            base_url: None,
            api_key_env: String::new(),
            max_output_tokens: 2048,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

impl ModelConfig {
    /// Model name, falling back to the provider default.
    pub fn model_name(&self) -> &str {
        if self.model.is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    /// API key variable, falling back to the provider default.
    pub fn api_key_env(&self) -> &str {
        if self.api_key_env.is_empty() {
            self.provider.default_api_key_env()
        } else {
            &self.api_key_env
        }
    }
}

/// File loading configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Downscale wider images to this width and re-encode as JPEG.
    pub resize_width: Option<u32>,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Filer's own organization; never reported as the counterparty.
    pub self_company_name: String,

    /// Field requests in flight per document (1 = sequential).
    pub concurrency: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            self_company_name: "TSKaigi Association".to_string(),
            concurrency: 1,
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the per-category files are written to.
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

impl KeihiConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
