//! Document categories and the typed records extracted from them.

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Answer the model gives when a registration number or withholding tax is absent.
pub const NOT_FOUND: &str = "なし";

lazy_static! {
    /// Qualified invoice issuer registration number: "T" followed by 13 digits.
    static ref REGISTRATION_NUMBER: Regex = Regex::new(r"^T\d{13}$").unwrap();
}

/// Kind of accounting document, decided by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocumentCategory {
    /// Receipt (領収書).
    Receipt,
    /// Invoice for services or goods (サービス請求書).
    ServiceInvoice,
    /// Invoice for outsourced work (業務委託請求書).
    OutsourcingInvoice,
    /// Quotation, unreadable, or anything else (不明).
    Unknown,
}

impl DocumentCategory {
    /// Categories that have a prompt set and a record shape.
    pub const KNOWN: [DocumentCategory; 3] = [
        DocumentCategory::Receipt,
        DocumentCategory::ServiceInvoice,
        DocumentCategory::OutsourcingInvoice,
    ];

    /// Label the model is asked to answer with.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentCategory::Receipt => "領収書",
            DocumentCategory::ServiceInvoice => "サービス請求書",
            DocumentCategory::OutsourcingInvoice => "業務委託請求書",
            DocumentCategory::Unknown => "不明",
        }
    }

    /// Map a model answer to a category by exact label match.
    ///
    /// Anything other than the three known labels, the explicit `不明`
    /// included, is `Unknown`.
    pub fn from_label(answer: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|category| category.label() == answer)
            .unwrap_or(DocumentCategory::Unknown)
    }

    /// File-name friendly identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            DocumentCategory::Receipt => "receipt",
            DocumentCategory::ServiceInvoice => "service_invoice",
            DocumentCategory::OutsourcingInvoice => "outsourcing_invoice",
            DocumentCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A named field extracted from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Company,
    TotalPrice,
    PublishedDate,
    PaymentDueDate,
    InvoiceNumber,
    Tax10,
    Tax8,
    WithholdingTax,
}

impl Field {
    /// Stable key used in exports and JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Company => "company",
            Field::TotalPrice => "totalPrice",
            Field::PublishedDate => "publishedDate",
            Field::PaymentDueDate => "paymentDueDate",
            Field::InvoiceNumber => "invoiceNumber",
            Field::Tax10 => "tax10",
            Field::Tax8 => "tax8",
            Field::WithholdingTax => "withholdingTax",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw model answers collected for one document, keyed by field.
pub type FieldAnswers = BTreeMap<Field, String>;

fn take(answers: &mut FieldAnswers, field: Field) -> Result<String, ExtractionError> {
    answers
        .remove(&field)
        .ok_or(ExtractionError::MissingField(field))
}

/// Fields read from a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptInfo {
    pub company: String,
    pub total_price: String,
    pub published_date: String,
    pub invoice_number: String,
    pub tax10: String,
    pub tax8: String,
}

impl ReceiptInfo {
    fn from_answers(answers: &mut FieldAnswers) -> Result<Self, ExtractionError> {
        Ok(Self {
            company: take(answers, Field::Company)?,
            total_price: take(answers, Field::TotalPrice)?,
            published_date: take(answers, Field::PublishedDate)?,
            invoice_number: take(answers, Field::InvoiceNumber)?,
            tax10: take(answers, Field::Tax10)?,
            tax8: take(answers, Field::Tax8)?,
        })
    }

    fn values(&self) -> Vec<(Field, &str)> {
        vec![
            (Field::Company, self.company.as_str()),
            (Field::TotalPrice, self.total_price.as_str()),
            (Field::PublishedDate, self.published_date.as_str()),
            (Field::InvoiceNumber, self.invoice_number.as_str()),
            (Field::Tax10, self.tax10.as_str()),
            (Field::Tax8, self.tax8.as_str()),
        ]
    }
}

/// Fields read from an invoice for services or goods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInvoiceInfo {
    pub company: String,
    pub total_price: String,
    pub published_date: String,
    pub payment_due_date: String,
    pub invoice_number: String,
    pub tax10: String,
    pub tax8: String,
}

impl ServiceInvoiceInfo {
    fn from_answers(answers: &mut FieldAnswers) -> Result<Self, ExtractionError> {
        Ok(Self {
            company: take(answers, Field::Company)?,
            total_price: take(answers, Field::TotalPrice)?,
            published_date: take(answers, Field::PublishedDate)?,
            payment_due_date: take(answers, Field::PaymentDueDate)?,
            invoice_number: take(answers, Field::InvoiceNumber)?,
            tax10: take(answers, Field::Tax10)?,
            tax8: take(answers, Field::Tax8)?,
        })
    }

    fn values(&self) -> Vec<(Field, &str)> {
        vec![
            (Field::Company, self.company.as_str()),
            (Field::TotalPrice, self.total_price.as_str()),
            (Field::PublishedDate, self.published_date.as_str()),
            (Field::PaymentDueDate, self.payment_due_date.as_str()),
            (Field::InvoiceNumber, self.invoice_number.as_str()),
            (Field::Tax10, self.tax10.as_str()),
            (Field::Tax8, self.tax8.as_str()),
        ]
    }
}

/// Fields read from an invoice for outsourced work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutsourcingInvoiceInfo {
    pub company: String,
    pub total_price: String,
    pub published_date: String,
    pub payment_due_date: String,
    pub invoice_number: String,
    pub tax10: String,
    pub withholding_tax: String,
}

impl OutsourcingInvoiceInfo {
    fn from_answers(answers: &mut FieldAnswers) -> Result<Self, ExtractionError> {
        Ok(Self {
            company: take(answers, Field::Company)?,
            total_price: take(answers, Field::TotalPrice)?,
            published_date: take(answers, Field::PublishedDate)?,
            payment_due_date: take(answers, Field::PaymentDueDate)?,
            invoice_number: take(answers, Field::InvoiceNumber)?,
            tax10: take(answers, Field::Tax10)?,
            withholding_tax: take(answers, Field::WithholdingTax)?,
        })
    }

    fn values(&self) -> Vec<(Field, &str)> {
        vec![
            (Field::Company, self.company.as_str()),
            (Field::TotalPrice, self.total_price.as_str()),
            (Field::PublishedDate, self.published_date.as_str()),
            (Field::PaymentDueDate, self.payment_due_date.as_str()),
            (Field::InvoiceNumber, self.invoice_number.as_str()),
            (Field::Tax10, self.tax10.as_str()),
            (Field::WithholdingTax, self.withholding_tax.as_str()),
        ]
    }
}

/// Typed result of scanning one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExtractionRecord {
    Receipt(ReceiptInfo),
    ServiceInvoice(ServiceInvoiceInfo),
    OutsourcingInvoice(OutsourcingInvoiceInfo),
    /// The file was unsupported or could not be classified.
    Unknown { filename: String },
}

impl ExtractionRecord {
    /// Record for a file that is not extracted.
    pub fn unknown(filename: impl Into<String>) -> Self {
        ExtractionRecord::Unknown {
            filename: filename.into(),
        }
    }

    /// Build the record for `category` from collected answers.
    ///
    /// Every field the category defines must be present; answers for fields
    /// the category does not define are ignored.
    pub fn assemble(
        category: DocumentCategory,
        mut answers: FieldAnswers,
    ) -> Result<Self, ExtractionError> {
        let record = match category {
            DocumentCategory::Receipt => {
                ExtractionRecord::Receipt(ReceiptInfo::from_answers(&mut answers)?)
            }
            DocumentCategory::ServiceInvoice => {
                ExtractionRecord::ServiceInvoice(ServiceInvoiceInfo::from_answers(&mut answers)?)
            }
            DocumentCategory::OutsourcingInvoice => ExtractionRecord::OutsourcingInvoice(
                OutsourcingInvoiceInfo::from_answers(&mut answers)?,
            ),
            DocumentCategory::Unknown => return Err(ExtractionError::UnknownCategory),
        };
        Ok(record)
    }

    pub fn category(&self) -> DocumentCategory {
        match self {
            ExtractionRecord::Receipt(_) => DocumentCategory::Receipt,
            ExtractionRecord::ServiceInvoice(_) => DocumentCategory::ServiceInvoice,
            ExtractionRecord::OutsourcingInvoice(_) => DocumentCategory::OutsourcingInvoice,
            ExtractionRecord::Unknown { .. } => DocumentCategory::Unknown,
        }
    }

    /// Extracted fields in prompt-set order. Empty for unknown records.
    pub fn fields(&self) -> Vec<(Field, &str)> {
        match self {
            ExtractionRecord::Receipt(info) => info.values(),
            ExtractionRecord::ServiceInvoice(info) => info.values(),
            ExtractionRecord::OutsourcingInvoice(info) => info.values(),
            ExtractionRecord::Unknown { .. } => Vec::new(),
        }
    }

    /// Value of a single field, if this record carries it.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields()
            .into_iter()
            .find_map(|(f, value)| (f == field).then_some(value))
    }

    /// Report advisory issues without touching any value.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if let ExtractionRecord::Unknown { filename } = self {
            issues.push(format!("Document was not extracted: {}", filename));
            return issues;
        }

        for (field, value) in self.fields() {
            if value.is_empty() {
                issues.push(format!("Empty answer for {}", field));
            }
        }

        if let Some(number) = self.get(Field::InvoiceNumber) {
            if !number.is_empty() && number != NOT_FOUND && !REGISTRATION_NUMBER.is_match(number)
            {
                issues.push(format!(
                    "Registration number is not \"T\" + 13 digits: {}",
                    number
                ));
            }
        }

        issues
    }
}
