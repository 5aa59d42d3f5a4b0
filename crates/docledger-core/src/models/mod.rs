//! Data models: document specs and configuration.

pub mod config;
pub mod spec;

pub use config::{ConverterKind, DocledgerConfig, LookupTables, PdfConfig, SpecialCase};
pub use spec::{
    AnnotationSpec, AttachmentKind, AttachmentSpec, DocumentSpec, DocumentType, DonationSpec,
    ExpenseSpec, InvoiceSpec, LedgerEntry, ReceiptSpec, SpecFields, StatementLayout,
    StatementSpec, TaxKind, TaxSpec,
};
