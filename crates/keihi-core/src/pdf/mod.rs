//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF text extraction implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text of every page, in page order.
    fn extract_pages(&self) -> Result<Vec<String>>;

    /// Extract text from the entire PDF, pages joined by newlines.
    fn extract_text(&self) -> Result<String> {
        Ok(self.extract_pages()?.join("\n"))
    }
}
