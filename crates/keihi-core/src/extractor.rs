//! Category-specific field extraction.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, trace};

use crate::error::{ExtractionError, ModelError, Result};
use crate::llm::{ask, ModelClient};
use crate::models::config::ExtractionConfig;
use crate::models::file::NormalizedFile;
use crate::models::record::{DocumentCategory, ExtractionRecord, FieldAnswers};
use crate::prompts::prompt_set;

/// Runs a category's prompt set against a file, one request per field.
#[derive(Clone)]
pub struct Extractor {
    client: Arc<dyn ModelClient>,
    config: ExtractionConfig,
}

impl Extractor {
    pub fn new(client: Arc<dyn ModelClient>, config: ExtractionConfig) -> Self {
        Self { client, config }
    }

    /// Collect one trimmed answer per prompt-set field and assemble the record.
    ///
    /// Field requests are independent; up to `concurrency` run at once. Any
    /// failed request fails the whole record.
    pub async fn extract(
        &self,
        file: &NormalizedFile,
        category: DocumentCategory,
    ) -> Result<ExtractionRecord> {
        let set = prompt_set(category).ok_or(ExtractionError::UnknownCategory)?;
        let prompts = set.render(&self.config.self_company_name);
        let client = self.client.as_ref();

        debug!(
            "Extracting {} fields from {} as {}",
            prompts.len(),
            file.filename(),
            category
        );

        let answers: FieldAnswers = stream::iter(prompts)
            .map(move |(field, instruction)| async move {
                let answer = ask(client, file, &instruction).await?;
                trace!("{} = {:?}", field, answer);
                Ok::<_, ModelError>((field, answer))
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        Ok(ExtractionRecord::assemble(category, answers)?)
    }
}
