//! End-to-end pipeline tests against a stubbed model provider.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pretty_assertions::assert_eq;

use keihi_core::llm::{ContentPart, ModelClient};
use keihi_core::prompts::{prompt_set, CLASSIFICATION_PROMPT};
use keihi_core::{
    load, Aggregation, DocumentCategory, ExtractionRecord, Field, KeihiConfig, ModelError,
    NormalizedFile, ScannedDocument, Scanner,
};

/// Answers the classification prompt with a label chosen per file payload
/// and every field prompt with `<field key>:<label>`.
struct StubModel {
    labels: HashMap<String, &'static str>,
    field_by_instruction: HashMap<String, Field>,
    requests: Mutex<usize>,
}

impl StubModel {
    fn new(config: &KeihiConfig) -> Self {
        let field_by_instruction = DocumentCategory::KNOWN
            .into_iter()
            .flat_map(|category| {
                prompt_set(category)
                    .unwrap()
                    .render(&config.extraction.self_company_name)
            })
            .map(|(field, instruction)| (instruction, field))
            .collect();

        Self {
            labels: HashMap::new(),
            field_by_instruction,
            requests: Mutex::new(0),
        }
    }

    /// Classify any request whose payload contains `needle` as `label`.
    fn label(mut self, needle: &str, label: &'static str) -> Self {
        self.labels.insert(needle.to_string(), label);
        self
    }

    fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

#[async_trait]
impl ModelClient for StubModel {
    async fn invoke(&self, parts: &[ContentPart]) -> Result<String, ModelError> {
        *self.requests.lock().unwrap() += 1;

        let payload: String = parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => text.as_str(),
                ContentPart::InlineData { data, .. } => data.as_str(),
            })
            .collect();
        let label = self
            .labels
            .iter()
            .find(|(needle, _)| payload.contains(needle.as_str()))
            .map(|(_, label)| *label)
            .unwrap_or("不明");

        let instruction = match parts.first() {
            Some(ContentPart::Text(text)) => text
                .rsplit_once("\"\"\"\n")
                .map(|(_, instruction)| instruction)
                .unwrap_or(text.as_str()),
            _ => "",
        };
        if instruction == CLASSIFICATION_PROMPT {
            return Ok(format!("\n{}\n", label));
        }

        let field = self
            .field_by_instruction
            .iter()
            .find(|(instruction, _)| payload.contains(instruction.as_str()))
            .map(|(_, field)| *field)
            .ok_or_else(|| ModelError::MalformedResponse("unexpected prompt".to_string()))?;
        Ok(format!("{}:{}", field, label))
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

fn write_png(dir: &Path, name: &str, shade: u8) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(3, 3, Rgb([shade, shade, shade]))
        .save(&path)
        .unwrap();
    path
}

fn write_pdf(dir: &Path, name: &str, line: &str) -> PathBuf {
    write_pdf_pages(dir, name, &[line])
}

/// One Courier text line per page.
fn write_pdf_pages(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for line in lines {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

fn document_text(path: &Path) -> String {
    match load(path).unwrap() {
        NormalizedFile::Document { text, .. } => text,
        other => panic!("expected document, got {other:?}"),
    }
}

#[test]
fn load_maps_extensions_to_variants() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "receipt.png", 10);
    let pdf = write_pdf(dir.path(), "invoice.pdf", "INVOICE 11000");

    assert!(matches!(load(&png).unwrap(), NormalizedFile::Image { .. }));

    match load(&pdf).unwrap() {
        NormalizedFile::Document { filename, .. } => {
            assert_eq!(filename, pdf.to_string_lossy())
        }
        other => panic!("expected document, got {other:?}"),
    }

    let txt = dir.path().join("notes.txt");
    std::fs::write(&txt, "memo").unwrap();
    assert!(matches!(
        load(&txt),
        Err(keihi_core::LoadError::UnsupportedFileType(_))
    ));
}

#[test]
fn pdf_pages_are_joined_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf_pages(dir.path(), "two_pages.pdf", &["PAGEONE", "PAGETWO"]);

    let text = document_text(&pdf);
    let first = text.find("PAGEONE").expect("first page text");
    let second = text.find("PAGETWO").expect("second page text");
    assert!(first < second, "pages out of order: {text:?}");
    assert!(text[first..second].contains('\n'));
}

#[test]
fn pdf_without_pages_loads_as_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf_pages(dir.path(), "blank.pdf", &[]);

    assert_eq!(document_text(&pdf), "");
}

#[tokio::test]
async fn empty_document_still_reaches_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let config = KeihiConfig::default();
    let pdf = write_pdf_pages(dir.path(), "blank.pdf", &[]);

    let model = Arc::new(StubModel::new(&config));
    let record = Scanner::new(model.clone(), &config)
        .scan_file(&pdf)
        .await
        .unwrap();

    assert_eq!(record, ExtractionRecord::unknown(pdf.to_string_lossy()));
    assert_eq!(model.requests(), 1);
}

#[tokio::test]
async fn batch_of_files_groups_by_category() {
    let dir = tempfile::tempdir().unwrap();
    let config = KeihiConfig::default();

    let receipt = write_png(dir.path(), "a_receipt.png", 10);
    let quotation = write_png(dir.path(), "b_quotation.png", 200);
    let memo = dir.path().join("c_memo.txt");
    std::fs::write(&memo, "not scanned").unwrap();

    let receipt_data = match load(&receipt).unwrap() {
        NormalizedFile::Image { base64_data, .. } => base64_data,
        other => panic!("expected image, got {other:?}"),
    };

    let model = Arc::new(StubModel::new(&config).label(&receipt_data, "領収書"));
    let scanner = Scanner::new(model.clone(), &config);

    let mut aggregation = Aggregation::new();
    for path in [&receipt, &quotation, &memo] {
        let record = scanner.scan_file(path).await.unwrap();
        aggregation.push(ScannedDocument::new(path.clone(), record));
    }

    // 1 classification + 6 fields for the receipt, 1 classification for the quotation
    assert_eq!(model.requests(), 8);
    assert_eq!(aggregation.len(), 3);

    let receipts = aggregation.get(DocumentCategory::Receipt);
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].record.get(Field::Tax8), Some("tax8:領収書"));
    assert_eq!(receipts[0].record.get(Field::Company), Some("company:領収書"));

    let unknown: Vec<_> = aggregation
        .get(DocumentCategory::Unknown)
        .iter()
        .map(|d| d.record.clone())
        .collect();
    assert_eq!(
        unknown,
        vec![
            ExtractionRecord::unknown(quotation.to_string_lossy()),
            ExtractionRecord::unknown(memo.to_string_lossy()),
        ]
    );
    assert!(aggregation.get(DocumentCategory::ServiceInvoice).is_empty());
}
