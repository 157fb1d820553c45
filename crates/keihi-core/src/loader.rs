//! File loading: classify by extension and normalize the content.

use std::io::Cursor;
use std::path::Path;

use base64::Engine as _;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, trace};

use crate::error::{LoadError, PdfError};
use crate::models::config::LoaderConfig;
use crate::models::file::NormalizedFile;
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Recognized input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Png,
    Jpeg,
    Pdf,
}

impl FileKind {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "png" => Some(FileKind::Png),
            "jpg" | "jpeg" => Some(FileKind::Jpeg),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, FileKind::Pdf)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Png => "image/png",
            FileKind::Jpeg => "image/jpeg",
            FileKind::Pdf => "application/pdf",
        }
    }
}

/// Turns files on disk into [`NormalizedFile`]s. Never writes to the source.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    config: LoaderConfig,
}

impl FileLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn load(&self, path: &Path) -> Result<NormalizedFile, LoadError> {
        let kind = FileKind::from_path(path)
            .ok_or_else(|| LoadError::UnsupportedFileType(path.to_path_buf()))?;
        let filename = path.to_string_lossy().into_owned();

        if kind.is_image() {
            let bytes = std::fs::read(path)?;
            let (bytes, mime_type) = match self.config.resize_width {
                Some(width) => downscale(bytes, kind, width)?,
                None => (bytes, kind.mime_type()),
            };
            debug!("Loaded image {} ({} bytes, {})", filename, bytes.len(), mime_type);

            Ok(NormalizedFile::Image {
                filename,
                mime_type: mime_type.to_string(),
                base64_data: base64::engine::general_purpose::STANDARD.encode(&bytes),
            })
        } else {
            let data = std::fs::read(path)?;
            let mut extractor = PdfExtractor::new();
            let text = match extractor.load(&data) {
                Ok(()) => extractor.extract_text()?,
                // Zero pages reads as empty text
                Err(PdfError::NoPages) => String::new(),
                Err(e) => return Err(e.into()),
            };
            debug!(
                "Loaded PDF {} ({} pages, {} chars)",
                filename,
                extractor.page_count(),
                text.chars().count()
            );

            Ok(NormalizedFile::Document { filename, text })
        }
    }
}

/// Load a file with the default loader settings.
pub fn load(path: impl AsRef<Path>) -> Result<NormalizedFile, LoadError> {
    FileLoader::default().load(path.as_ref())
}

/// Shrink images wider than `width` and re-encode them as JPEG.
fn downscale(
    bytes: Vec<u8>,
    kind: FileKind,
    width: u32,
) -> Result<(Vec<u8>, &'static str), LoadError> {
    let img = image::load_from_memory(&bytes)?;
    if width == 0 || img.width() <= width {
        trace!("Image is {}px wide, keeping original", img.width());
        return Ok((bytes, kind.mime_type()));
    }

    let height = ((img.height() as u64 * width as u64) / img.width() as u64).max(1) as u32;
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)?;
    debug!(
        "Resized image {}x{} -> {}x{}",
        img.width(),
        img.height(),
        width,
        height
    );
    Ok((out, FileKind::Jpeg.mime_type()))
}
