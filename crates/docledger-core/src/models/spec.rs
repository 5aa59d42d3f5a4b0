//! Document spec models produced by classification.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Priority assigned to categories outside the ordering table.
pub const UNKNOWN_PRIORITY: u32 = 99;

/// Category of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Bank account or credit card statement.
    Statement,
    /// Supporting document attached to another ledger entry.
    Attachment,
    /// Expense voucher or incoming expense CFDI.
    Expense,
    /// Tax payment receipt.
    Tax,
    /// Issued or third-party invoice.
    Invoice,
    /// Utility or service receipt.
    Receipt,
    /// Free-form note filed against a month.
    Annotation,
    /// Donation receipt.
    Donation,
}

impl DocumentType {
    /// Position in the detector ordering, lower runs first.
    pub fn priority(&self) -> u32 {
        match self {
            DocumentType::Statement => 1,
            DocumentType::Attachment => 2,
            DocumentType::Expense => 3,
            DocumentType::Tax => 4,
            DocumentType::Invoice => 5,
            DocumentType::Receipt => 6,
            DocumentType::Annotation => 7,
            DocumentType::Donation => UNKNOWN_PRIORITY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Statement => "statement",
            DocumentType::Attachment => "attachment",
            DocumentType::Expense => "expense",
            DocumentType::Tax => "tax",
            DocumentType::Invoice => "invoice",
            DocumentType::Receipt => "receipt",
            DocumentType::Annotation => "annotation",
            DocumentType::Donation => "donation",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every spec variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecFields {
    /// Ledger year the document belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Ledger month (1-12).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,

    /// Amount in cents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    /// Bank or service account the document refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,

    /// Property the document is filed under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_key: Option<String>,

    /// Human readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_filename: Option<String>,

    /// Filename proposed by the matching strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SpecFields {
    pub fn with_period(mut self, year: i32, month: u32) -> Self {
        self.year = Some(year);
        self.month = Some(month);
        self
    }

    pub fn with_amount(mut self, cents: Option<i64>) -> Self {
        self.amount = cents;
        self
    }

    pub fn with_account(mut self, account: Option<String>) -> Self {
        self.account_number = account;
        self
    }

    pub fn with_property(mut self, property: Option<String>) -> Self {
        self.property_key = property;
        self
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display_filename = Some(display.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// One movement of a statement ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Operation date.
    pub date: NaiveDate,
    /// Movement description as printed.
    pub description: String,
    /// Signed amount in cents; debits are negative.
    pub amount: i64,
    /// Running balance in cents, when printed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
}

/// Statement layout the spec was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementLayout {
    /// Checking account layout with CARGOS/ABONOS columns.
    Account,
    /// Credit card layout with abbreviated month dates.
    Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSpec {
    #[serde(flatten)]
    pub fields: SpecFields,
    pub bank: String,
    pub layout: StatementLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub transactions: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Tax authority acknowledgement of a filed declaration.
    TaxNotice,
    /// CFDI issued by a bank to one of our tax ids.
    BankCfdi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSpec {
    #[serde(flatten)]
    pub fields: SpecFields,
    pub kind: AttachmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_rfc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSpec {
    #[serde(flatten)]
    pub fields: SpecFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_rfc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxKind {
    /// Federal tax paid through a bank.
    FederalPayment,
    /// Municipal property tax.
    PropertyTax,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSpec {
    #[serde(flatten)]
    pub fields: SpecFields,
    pub kind: TaxKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSpec {
    #[serde(flatten)]
    pub fields: SpecFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_rfc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_rfc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSpec {
    #[serde(flatten)]
    pub fields: SpecFields,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSpec {
    #[serde(flatten)]
    pub fields: SpecFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donee_rfc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSpec {
    #[serde(flatten)]
    pub fields: SpecFields,
}

/// Structured result of classifying one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSpec {
    Statement(StatementSpec),
    Attachment(AttachmentSpec),
    Expense(ExpenseSpec),
    Tax(TaxSpec),
    Invoice(InvoiceSpec),
    Receipt(ReceiptSpec),
    Donation(DonationSpec),
    Annotation(AnnotationSpec),
}

impl DocumentSpec {
    /// Category of this spec.
    pub fn document_type(&self) -> DocumentType {
        match self {
            DocumentSpec::Statement(_) => DocumentType::Statement,
            DocumentSpec::Attachment(_) => DocumentType::Attachment,
            DocumentSpec::Expense(_) => DocumentType::Expense,
            DocumentSpec::Tax(_) => DocumentType::Tax,
            DocumentSpec::Invoice(_) => DocumentType::Invoice,
            DocumentSpec::Receipt(_) => DocumentType::Receipt,
            DocumentSpec::Donation(_) => DocumentType::Donation,
            DocumentSpec::Annotation(_) => DocumentType::Annotation,
        }
    }

    /// Shared fields of the spec.
    pub fn fields(&self) -> &SpecFields {
        match self {
            DocumentSpec::Statement(s) => &s.fields,
            DocumentSpec::Attachment(s) => &s.fields,
            DocumentSpec::Expense(s) => &s.fields,
            DocumentSpec::Tax(s) => &s.fields,
            DocumentSpec::Invoice(s) => &s.fields,
            DocumentSpec::Receipt(s) => &s.fields,
            DocumentSpec::Donation(s) => &s.fields,
            DocumentSpec::Annotation(s) => &s.fields,
        }
    }

    fn fields_mut(&mut self) -> &mut SpecFields {
        match self {
            DocumentSpec::Statement(s) => &mut s.fields,
            DocumentSpec::Attachment(s) => &mut s.fields,
            DocumentSpec::Expense(s) => &mut s.fields,
            DocumentSpec::Tax(s) => &mut s.fields,
            DocumentSpec::Invoice(s) => &mut s.fields,
            DocumentSpec::Receipt(s) => &mut s.fields,
            DocumentSpec::Donation(s) => &mut s.fields,
            DocumentSpec::Annotation(s) => &mut s.fields,
        }
    }

    /// Attach the suggested filename. Only the detector calls this, before
    /// the spec is handed out.
    pub(crate) fn with_suggested_filename(mut self, filename: String) -> Self {
        self.fields_mut().suggested_filename = Some(filename);
        self
    }

    pub fn year(&self) -> Option<i32> {
        self.fields().year
    }

    pub fn month(&self) -> Option<u32> {
        self.fields().month
    }

    pub fn amount(&self) -> Option<i64> {
        self.fields().amount
    }

    pub fn suggested_filename(&self) -> Option<&str> {
        self.fields().suggested_filename.as_deref()
    }
}
