//! Tax-XML (CFDI) loading.
//!
//! Strategies only see [`TaxDocument`], a narrow projection of the fields
//! classification needs. Elements are matched on local names so both the
//! 3.3 and 4.0 namespaces work.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ExtractionError;
use crate::rules::{amount_to_cents, parse_iso_date};

/// Fields of a CFDI consumed by the strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxDocument {
    pub version: Option<String>,
    /// `I` income, `E` egress, `P` payment, ...
    pub voucher_type: Option<String>,
    pub series: Option<String>,
    pub folio: Option<String>,
    pub issue_date: NaiveDate,
    /// Total in cents.
    pub total: i64,
    /// Subtotal in cents.
    pub subtotal: Option<i64>,
    pub issuer_rfc: String,
    pub issuer_name: Option<String>,
    pub recipient_rfc: String,
    pub recipient_name: Option<String>,
    /// Concept descriptions in document order.
    pub concepts: Vec<String>,
    /// Fiscal stamp UUID.
    pub uuid: Option<String>,
    /// Carries the donation complement.
    pub donation: bool,
}

impl TaxDocument {
    pub fn year(&self) -> i32 {
        self.issue_date.year()
    }

    pub fn month(&self) -> u32 {
        self.issue_date.month()
    }

    pub fn first_concept(&self) -> Option<&str> {
        self.concepts.first().map(String::as_str)
    }
}

/// Loads tax XML into a [`TaxDocument`].
pub trait TaxXmlLoader: Send + Sync {
    /// `Ok(None)` for content that is not a CFDI; an error for a CFDI that
    /// breaks the schema.
    fn load(&self, xml: &str) -> Result<Option<TaxDocument>, ExtractionError>;
}

/// CFDI loader built on the quick-xml pull reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct CfdiLoader;

impl CfdiLoader {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Default)]
struct RawCfdi {
    root: HashMap<String, String>,
    issuer: HashMap<String, String>,
    recipient: HashMap<String, String>,
    concepts: Vec<String>,
    uuid: Option<String>,
    donation: bool,
}

impl TaxXmlLoader for CfdiLoader {
    fn load(&self, xml: &str) -> Result<Option<TaxDocument>, ExtractionError> {
        if !xml.trim_start().starts_with('<') {
            return Ok(None);
        }

        let mut reader = Reader::from_str(xml);
        let mut raw = RawCfdi::default();
        let mut in_root = false;
        // Local names of the open elements, root first.
        let mut open: Vec<Vec<u8>> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if !raw.visit(&e, &open, &mut in_root)? {
                        return Ok(None);
                    }
                    open.push(e.local_name().as_ref().to_vec());
                }
                Ok(Event::Empty(e)) => {
                    if !raw.visit(&e, &open, &mut in_root)? {
                        return Ok(None);
                    }
                }
                Ok(Event::End(_)) => {
                    open.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) if in_root => {
                    return Err(ExtractionError::TaxXml(format!(
                        "malformed CFDI at position {}: {}",
                        reader.error_position(),
                        e
                    )));
                }
                Err(e) => {
                    debug!("Content is not well-formed XML: {}", e);
                    return Ok(None);
                }
                _ => {}
            }
        }

        if !in_root {
            return Ok(None);
        }

        raw.into_document().map(Some)
    }
}

impl RawCfdi {
    /// Record the element if classification needs it. `open` holds the
    /// local names of its ancestors, root first. Returns `false` when the
    /// root element is not a `Comprobante`.
    fn visit(
        &mut self,
        e: &BytesStart<'_>,
        open: &[Vec<u8>],
        in_root: &mut bool,
    ) -> Result<bool, ExtractionError> {
        let local = e.local_name();
        let name = local.as_ref();

        if !*in_root {
            if name != b"Comprobante" {
                trace!("Root element is not a Comprobante");
                return Ok(false);
            }
            *in_root = true;
            self.root = attributes(e)?;
            return Ok(true);
        }

        // Complements (nomina12, cce20, ...) reuse Emisor and Receptor;
        // only the root's own children count.
        let parent = open.last().map(Vec::as_slice);
        match (name, open.len(), parent) {
            (b"Emisor", 1, _) => self.issuer = attributes(e)?,
            (b"Receptor", 1, _) => self.recipient = attributes(e)?,
            (b"Concepto", 2, Some(b"Conceptos")) => {
                if let Some(desc) = attributes(e)?.remove("Descripcion") {
                    self.concepts.push(desc);
                }
            }
            (b"TimbreFiscalDigital", _, _) => self.uuid = attributes(e)?.remove("UUID"),
            (b"Donatarias", _, _) => self.donation = true,
            _ => {}
        }
        Ok(true)
    }

    fn into_document(mut self) -> Result<TaxDocument, ExtractionError> {
        let total_raw = self
            .root
            .remove("Total")
            .ok_or_else(|| ExtractionError::TaxXml("Comprobante without Total".to_string()))?;
        let total = amount_to_cents(&total_raw)
            .ok_or_else(|| ExtractionError::parse("Total", total_raw.clone()))?;

        let date_raw = self
            .root
            .remove("Fecha")
            .ok_or_else(|| ExtractionError::TaxXml("Comprobante without Fecha".to_string()))?;
        let issue_date =
            parse_iso_date(&date_raw).ok_or_else(|| ExtractionError::parse("Fecha", date_raw.clone()))?;

        let issuer_rfc = self
            .issuer
            .remove("Rfc")
            .ok_or_else(|| ExtractionError::TaxXml("Emisor without Rfc".to_string()))?;
        let recipient_rfc = self
            .recipient
            .remove("Rfc")
            .ok_or_else(|| ExtractionError::TaxXml("Receptor without Rfc".to_string()))?;

        Ok(TaxDocument {
            version: self.root.remove("Version"),
            voucher_type: self.root.remove("TipoDeComprobante"),
            series: self.root.remove("Serie"),
            folio: self.root.remove("Folio"),
            issue_date,
            total,
            subtotal: self.root.get("SubTotal").and_then(|s| amount_to_cents(s)),
            issuer_rfc: issuer_rfc.trim().to_uppercase(),
            issuer_name: self.issuer.remove("Nombre"),
            recipient_rfc: recipient_rfc.trim().to_uppercase(),
            recipient_name: self.recipient.remove("Nombre"),
            concepts: self.concepts,
            uuid: self.uuid,
            donation: self.donation,
        })
    }
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, ExtractionError> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ExtractionError::TaxXml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ExtractionError::TaxXml(err.to_string()))?;
        map.insert(key, value.into_owned());
    }
    Ok(map)
}
