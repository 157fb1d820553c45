//! In-memory representation of a loaded source file.

use serde::Serialize;

/// A source file after loading, independent of its on-disk format.
///
/// Images keep their bytes as an opaque base64 payload; documents keep only
/// their extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedFile {
    /// Raster image, base64 encoded for embedding in a model request.
    Image {
        filename: String,
        mime_type: String,
        base64_data: String,
    },
    /// Portable document reduced to plain text.
    Document { filename: String, text: String },
}

impl NormalizedFile {
    /// Name of the file this was loaded from.
    pub fn filename(&self) -> &str {
        match self {
            NormalizedFile::Image { filename, .. } | NormalizedFile::Document { filename, .. } => {
                filename
            }
        }
    }

    /// Size of the payload sent to the model, in bytes.
    pub fn payload_len(&self) -> usize {
        match self {
            NormalizedFile::Image { base64_data, .. } => base64_data.len(),
            NormalizedFile::Document { text, .. } => text.len(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, NormalizedFile::Image { .. })
    }
}
