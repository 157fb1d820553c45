//! Document classification through the model.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ModelError;
use crate::llm::{ask, ModelClient};
use crate::models::file::NormalizedFile;
use crate::models::record::DocumentCategory;
use crate::prompts::CLASSIFICATION_PROMPT;

/// Asks the model which kind of accounting document a file is.
#[derive(Clone)]
pub struct Classifier {
    client: Arc<dyn ModelClient>,
}

impl Classifier {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    /// One request, exact label match, no retry on an unexpected answer.
    ///
    /// Any answer other than the three known labels yields
    /// [`DocumentCategory::Unknown`].
    pub async fn detect_category(
        &self,
        file: &NormalizedFile,
    ) -> Result<DocumentCategory, ModelError> {
        debug!(
            "Classifying {} ({} payload bytes)",
            file.filename(),
            file.payload_len()
        );
        let answer = ask(self.client.as_ref(), file, CLASSIFICATION_PROMPT).await?;
        let category = DocumentCategory::from_label(&answer);

        if category == DocumentCategory::Unknown {
            warn!("Document type detection failed for {}: {:?}", file.filename(), answer);
        } else {
            debug!("Classified {} as {}", file.filename(), category);
        }
        Ok(category)
    }
}
