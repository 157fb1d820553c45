//! Per-category table export.

use std::fs;
use std::path::{Path, PathBuf};

use keihi_core::prompts::prompt_set;
use keihi_core::{Aggregation, DocumentCategory, ScannedDocument};
use tracing::debug;

/// Export file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// One CSV table per category
    Csv,
    /// One JSON array per category
    Json,
}

impl ExportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Column header for a category: source file, then the prompt-set fields.
pub fn header(category: DocumentCategory) -> Vec<&'static str> {
    let mut columns = vec!["file"];
    if let Some(set) = prompt_set(category) {
        columns.extend(set.fields().map(|field| field.key()));
    }
    columns
}

/// One CSV row, values verbatim.
pub fn row(document: &ScannedDocument) -> Vec<String> {
    let mut values = vec![document.source.to_string_lossy().into_owned()];
    values.extend(
        document
            .record
            .fields()
            .into_iter()
            .map(|(_, value)| value.to_string()),
    );
    values
}

/// Write one file per non-empty category group. Returns the files written.
pub fn write_aggregation(
    aggregation: &Aggregation,
    output_dir: &Path,
    format: ExportFormat,
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    for (category, documents) in aggregation.groups() {
        let path = output_dir.join(format!("{}.{}", category.slug(), format.extension()));
        match format {
            ExportFormat::Csv => write_csv(&path, category, documents)?,
            ExportFormat::Json => fs::write(&path, serde_json::to_string_pretty(documents)?)?,
        }
        debug!("Wrote {} {} records to {}", documents.len(), category, path.display());
        written.push(path);
    }

    Ok(written)
}

fn write_csv(
    path: &Path,
    category: DocumentCategory,
    documents: &[ScannedDocument],
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(header(category))?;
    for document in documents {
        wtr.write_record(row(document))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `failures.csv` listing files that could not be scanned.
pub fn write_failures(output_dir: &Path, failures: &[(PathBuf, String)]) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join("failures.csv");

    let mut wtr = csv::Writer::from_path(&path)?;
    wtr.write_record(["file", "error"])?;
    for (file, error) in failures {
        wtr.write_record([file.to_string_lossy().as_ref(), error.as_str()])?;
    }
    wtr.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keihi_core::{ExtractionRecord, OutsourcingInvoiceInfo, ReceiptInfo};
    use pretty_assertions::assert_eq;

    fn receipt(company: &str, tax8: &str) -> ExtractionRecord {
        ExtractionRecord::Receipt(ReceiptInfo {
            company: company.to_string(),
            total_price: "1,100".to_string(),
            published_date: "2024年11月15日".to_string(),
            invoice_number: "T1234567890123".to_string(),
            tax10: "100".to_string(),
            tax8: tax8.to_string(),
        })
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            header(DocumentCategory::Receipt),
            vec!["file", "company", "totalPrice", "publishedDate", "invoiceNumber", "tax10", "tax8"]
        );
        assert_eq!(
            header(DocumentCategory::OutsourcingInvoice),
            vec![
                "file",
                "company",
                "totalPrice",
                "publishedDate",
                "paymentDueDate",
                "invoiceNumber",
                "tax10",
                "withholdingTax"
            ]
        );
        assert_eq!(header(DocumentCategory::Unknown), vec!["file"]);
    }

    #[test]
    fn test_csv_per_category_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let aggregation: Aggregation = vec![
            ScannedDocument::new("r1.jpg", receipt("居酒屋さくら 渋谷店", "0")),
            ScannedDocument::new("memo.txt", ExtractionRecord::unknown("memo.txt")),
            ScannedDocument::new("r2.png", receipt("株式会社カクヤス", "391")),
        ]
        .into_iter()
        .collect();

        let written = write_aggregation(&aggregation, dir.path(), ExportFormat::Csv).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("receipt.csv"), dir.path().join("unknown.csv")]
        );
        assert!(!dir.path().join("service_invoice.csv").exists());
        assert!(!dir.path().join("outsourcing_invoice.csv").exists());

        let receipts = fs::read_to_string(dir.path().join("receipt.csv")).unwrap();
        assert_eq!(
            receipts,
            "file,company,totalPrice,publishedDate,invoiceNumber,tax10,tax8\n\
             r1.jpg,居酒屋さくら 渋谷店,\"1,100\",2024年11月15日,T1234567890123,100,0\n\
             r2.png,株式会社カクヤス,\"1,100\",2024年11月15日,T1234567890123,100,391\n"
        );

        let unknown = fs::read_to_string(dir.path().join("unknown.csv")).unwrap();
        assert_eq!(unknown, "file\nmemo.txt\n");
    }

    #[test]
    fn test_json_export() {
        let dir = tempfile::tempdir().unwrap();
        let aggregation: Aggregation = vec![ScannedDocument::new(
            "contract.pdf",
            ExtractionRecord::OutsourcingInvoice(OutsourcingInvoiceInfo {
                company: "山田太郎".to_string(),
                total_price: "99790".to_string(),
                published_date: "2024-10-31".to_string(),
                payment_due_date: "2024-11-30".to_string(),
                invoice_number: "なし".to_string(),
                tax10: "10000".to_string(),
                withholding_tax: "10210".to_string(),
            }),
        )]
        .into_iter()
        .collect();

        write_aggregation(&aggregation, dir.path(), ExportFormat::Json).unwrap();

        let json: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("outsourcing_invoice.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json[0]["source"], "contract.pdf");
        assert_eq!(json[0]["record"]["type"], "OutsourcingInvoice");
        assert_eq!(json[0]["record"]["withholdingTax"], "10210");
    }

    #[test]
    fn test_empty_aggregation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let written =
            write_aggregation(&Aggregation::new(), dir.path(), ExportFormat::Csv).unwrap();

        assert!(written.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failures_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_failures(
            dir.path(),
            &[(PathBuf::from("broken.pdf"), "PDF is encrypted".to_string())],
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "file,error\nbroken.pdf,PDF is encrypted\n"
        );
    }
}
