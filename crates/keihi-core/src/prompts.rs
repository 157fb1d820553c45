//! Fixed instructions sent to the model.
//!
//! Each known category owns one [`PromptSet`]: an ordered list of
//! `(field, instruction)` pairs. The extraction policies (tax-rate
//! substitution, registration-number format, own-company exclusion) live in
//! the instruction text; nothing in code enforces them.

use crate::models::record::{DocumentCategory, Field};

/// Replaced with the filer's own organization name before sending.
pub const SELF_COMPANY_PLACEHOLDER: &str = "{self_company}";

/// Asks for exactly one category label.
pub const CLASSIFICATION_PROMPT: &str = "\
領収書か、サービスや物品購入の請求書か、業務委託の請求書か見積書かを判定してください。
領収書の場合は「領収書」、サービスや物品購入の請求書の場合は「サービス請求書」、業務委託の請求書の場合は「業務委託請求書」と出力してください。
見積書または、どれにも該当しない場合は「不明」と出力してください。";

const TOTAL_PRICE: &str = "合計金額を抜き出して。出力は金額の数値だけを出して。";

const PUBLISHED_DATE: &str = "発行された日付を抜き出して。";

const PAYMENT_DUE_DATE: &str = "支払期限を抜き出して。";

const INVOICE_NUMBER: &str = "\
登録番号を抜き出して。
登録番号は、\"T\" + 数字13桁の形式です。
出力は登録番号だけを出して。
\"T\"から始まる登録番号が見つからない場合は、「なし」を出して";

const TAX_10: &str = "\
税率10%対象の消費税額を金額の数値だけ抜き出して。\
10%の記載が無い時は、税率8%対象の消費税が見つかった場合は\"0\"、\
見つからない場合は消費税額を見つけて金額の数値だけ抜き出して";

const TAX_8: &str = "\
税率8%対象の消費税額を金額の数値だけ抜き出して。\
8%の記載がない場合は、税率10%対象の消費税が見つかった場合は\"0\"、\
見つからない場合は消費税額を見つけて金額の数値だけ抜き出して";

const WITHHOLDING_TAX: &str =
    "源泉所得税の金額を数値だけ抜き出して。該当する項目が無い場合は、\"なし\"と出力して";

const STORE_COMPANY: &str = "\
会社名、または、店名を抜き出して。出力は名前だけを出して。
\"{self_company}\"が含まれる会社名は、自社なので無視をして。
会社名 > 店名の順の優先度で抜き出して。
店名の場合は、地名まで含めて出して。";

const SERVICE_COMPANY: &str = "\
会社名、店名を抜き出して。出力は名前だけを出して。
\"{self_company}\"が含まれる会社名は、自社なので無視をして。
会社名 > 店名の順の優先度で抜き出して。
店名の場合は、地名まで含めて出して。";

const CONTRACTOR_COMPANY: &str = "\
会社名、または、個人名を抜き出して。出力は名前だけを出して。
\"{self_company}\"が含まれる会社名は、自社なので無視をして。
会社名 > 個人名の順の優先度で抜き出して。";

/// The fixed instructions for one document category.
#[derive(Debug)]
pub struct PromptSet {
    pub category: DocumentCategory,
    pub prompts: &'static [(Field, &'static str)],
}

impl PromptSet {
    /// Field names, in prompt order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.prompts.iter().map(|(field, _)| *field)
    }

    /// Instructions with the own-company placeholder filled in.
    pub fn render(&self, self_company: &str) -> Vec<(Field, String)> {
        self.prompts
            .iter()
            .map(|(field, prompt)| (*field, prompt.replace(SELF_COMPANY_PLACEHOLDER, self_company)))
            .collect()
    }
}

pub static RECEIPT_PROMPTS: PromptSet = PromptSet {
    category: DocumentCategory::Receipt,
    prompts: &[
        (Field::Company, STORE_COMPANY),
        (Field::TotalPrice, TOTAL_PRICE),
        (Field::PublishedDate, PUBLISHED_DATE),
        (Field::InvoiceNumber, INVOICE_NUMBER),
        (Field::Tax10, TAX_10),
        (Field::Tax8, TAX_8),
    ],
};

pub static SERVICE_INVOICE_PROMPTS: PromptSet = PromptSet {
    category: DocumentCategory::ServiceInvoice,
    prompts: &[
        (Field::Company, SERVICE_COMPANY),
        (Field::TotalPrice, TOTAL_PRICE),
        (Field::PublishedDate, PUBLISHED_DATE),
        (Field::PaymentDueDate, PAYMENT_DUE_DATE),
        (Field::InvoiceNumber, INVOICE_NUMBER),
        (Field::Tax10, TAX_10),
        (Field::Tax8, TAX_8),
    ],
};

pub static OUTSOURCING_INVOICE_PROMPTS: PromptSet = PromptSet {
    category: DocumentCategory::OutsourcingInvoice,
    prompts: &[
        (Field::Company, CONTRACTOR_COMPANY),
        (Field::TotalPrice, TOTAL_PRICE),
        (Field::PublishedDate, PUBLISHED_DATE),
        (Field::PaymentDueDate, PAYMENT_DUE_DATE),
        (Field::InvoiceNumber, INVOICE_NUMBER),
        (Field::Tax10, TAX_10),
        (Field::WithholdingTax, WITHHOLDING_TAX),
    ],
};

/// Prompt set for a category; `None` for `Unknown`.
pub fn prompt_set(category: DocumentCategory) -> Option<&'static PromptSet> {
    match category {
        DocumentCategory::Receipt => Some(&RECEIPT_PROMPTS),
        DocumentCategory::ServiceInvoice => Some(&SERVICE_INVOICE_PROMPTS),
        DocumentCategory::OutsourcingInvoice => Some(&OUTSOURCING_INVOICE_PROMPTS),
        DocumentCategory::Unknown => None,
    }
}
