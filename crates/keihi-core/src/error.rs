//! Error types for the keihi-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::record::Field;

/// Main error type for the keihi library.
#[derive(Error, Debug)]
pub enum KeihiError {
    /// File loading error.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Model provider error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Record extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning a file on disk into a normalized file.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The extension is not on the image or document allow-list.
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFileType(PathBuf),

    /// PDF text extraction failed.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Image re-encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors returned by a model provider.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The HTTP round trip failed (connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The provider answered, but not in the expected shape.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The client could not be configured.
    #[error("client configuration: {0}")]
    Config(String),
}

impl ModelError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ModelError::Api { status, .. } => *status == 429 || *status >= 500,
            ModelError::MalformedResponse(_) | ModelError::Config(_) => false,
        }
    }
}

/// Errors related to record extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Extraction was requested for a document that was not classified.
    #[error("cannot extract fields from an unknown document")]
    UnknownCategory,

    /// A prompt-set field had no collected answer.
    #[error("missing answer for field: {0}")]
    MissingField(Field),
}

/// Result type for the keihi library.
pub type Result<T> = std::result::Result<T, KeihiError>;
