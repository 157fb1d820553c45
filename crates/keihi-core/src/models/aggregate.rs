//! Grouping of scanned records by document category.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::record::{DocumentCategory, ExtractionRecord};

/// A record together with the file it was scanned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedDocument {
    pub source: PathBuf,
    pub record: ExtractionRecord,
}

impl ScannedDocument {
    pub fn new(source: impl Into<PathBuf>, record: ExtractionRecord) -> Self {
        Self {
            source: source.into(),
            record,
        }
    }

    pub fn category(&self) -> DocumentCategory {
        self.record.category()
    }
}

/// Scanned documents grouped by category tag, input order kept per group.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    groups: BTreeMap<DocumentCategory, Vec<ScannedDocument>>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: ScannedDocument) {
        self.groups
            .entry(document.category())
            .or_default()
            .push(document);
    }

    /// Documents of one category, possibly empty.
    pub fn get(&self, category: DocumentCategory) -> &[ScannedDocument] {
        self.groups
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Non-empty groups in category order.
    pub fn groups(&self) -> impl Iterator<Item = (DocumentCategory, &[ScannedDocument])> {
        self.groups
            .iter()
            .filter(|(_, documents)| !documents.is_empty())
            .map(|(category, documents)| (*category, documents.as_slice()))
    }

    /// Total number of documents across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<ScannedDocument> for Aggregation {
    fn from_iter<I: IntoIterator<Item = ScannedDocument>>(iter: I) -> Self {
        let mut aggregation = Aggregation::new();
        for document in iter {
            aggregation.push(document);
        }
        aggregation
    }
}

impl Extend<ScannedDocument> for Aggregation {
    fn extend<I: IntoIterator<Item = ScannedDocument>>(&mut self, iter: I) {
        for document in iter {
            self.push(document);
        }
    }
}
