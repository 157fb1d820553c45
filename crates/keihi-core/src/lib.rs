//! Core library for receipt and invoice scanning.
//!
//! This crate provides:
//! - File loading (images to base64, PDFs to plain text)
//! - Document classification through a multimodal language model
//! - Category-specific field extraction with fixed prompt sets
//! - Record aggregation by document category

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod loader;
pub mod models;
pub mod pdf;
pub mod prompts;
pub mod scanner;

pub use classifier::Classifier;
pub use error::{ExtractionError, KeihiError, LoadError, ModelError, PdfError, Result};
pub use extractor::Extractor;
pub use llm::{create_client, ContentPart, ModelClient};
pub use loader::{load, FileLoader};
pub use models::config::KeihiConfig;
pub use models::file::NormalizedFile;
pub use models::aggregate::{Aggregation, ScannedDocument};
pub use models::record::{
    DocumentCategory, ExtractionRecord, Field, OutsourcingInvoiceInfo, ReceiptInfo,
    ServiceInvoiceInfo,
};
pub use scanner::Scanner;
