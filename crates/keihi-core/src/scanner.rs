//! Load → classify → extract, for one file at a time.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::error::{LoadError, Result};
use crate::extractor::Extractor;
use crate::llm::ModelClient;
use crate::loader::FileLoader;
use crate::models::config::KeihiConfig;
use crate::models::file::NormalizedFile;
use crate::models::record::{DocumentCategory, ExtractionRecord};

/// The entry point the export layer depends on.
#[derive(Clone)]
pub struct Scanner {
    loader: FileLoader,
    classifier: Classifier,
    extractor: Extractor,
}

impl Scanner {
    /// Build a scanner sharing one model client between its stages.
    pub fn new(client: Arc<dyn ModelClient>, config: &KeihiConfig) -> Self {
        Self {
            loader: FileLoader::new(config.loader.clone()),
            classifier: Classifier::new(client.clone()),
            extractor: Extractor::new(client, config.extraction.clone()),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn loader(&self) -> &FileLoader {
        &self.loader
    }

    /// Scan one file.
    ///
    /// Unsupported extensions and unclassifiable documents come back as
    /// [`ExtractionRecord::Unknown`] carrying the path as given. Read and
    /// model failures are returned as errors.
    pub async fn scan_file(&self, path: &Path) -> Result<ExtractionRecord> {
        let file = match self.loader.load(path) {
            Ok(file) => file,
            Err(LoadError::UnsupportedFileType(_)) => {
                warn!(
                    "Unsupported file type, extension must be .png, .jpg, .jpeg or .pdf: {}",
                    path.display()
                );
                return Ok(ExtractionRecord::unknown(path.to_string_lossy()));
            }
            Err(e) => return Err(e.into()),
        };

        self.scan_loaded(&file).await
    }

    /// Classify and extract an already loaded file.
    pub async fn scan_loaded(&self, file: &NormalizedFile) -> Result<ExtractionRecord> {
        let category = self.classifier.detect_category(file).await?;
        info!(
            "{} ({}) classified as {}",
            file.filename(),
            if file.is_image() { "image" } else { "document" },
            category
        );

        if category == DocumentCategory::Unknown {
            return Ok(ExtractionRecord::unknown(file.filename()));
        }

        self.extractor.extract(file, category).await
    }
}
