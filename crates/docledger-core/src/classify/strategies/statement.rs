//! BBVA account and credit card statements.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace, warn};

use super::{capture, compose_filename, period_label, wrong_variant};
use crate::classify::strategy::{MatchContext, MatchOutcome, Strategy};
use crate::error::{ExtractionError, FilenameError};
use crate::models::{
    DocumentSpec, DocumentType, LedgerEntry, LookupTables, SpecFields, StatementLayout,
    StatementSpec,
};
use crate::rules::blocks::char_column;
use crate::rules::{
    account_from_clabe, amount_to_cents, collapse_whitespace, extract_clabe, labeled_amount,
    parse_abbreviated_date,
};

const BANK: &str = "BBVA";

lazy_static! {
    static ref ACCOUNT_NUMBER: Regex =
        Regex::new(r"(?i)no\.?\s*de\s*cuenta:?\s*(\d{10,11})\b").unwrap();
    static ref CLIENT_NUMBER: Regex =
        Regex::new(r"(?i)no\.?\s*de\s*cliente:?\s*([A-Z0-9]+)").unwrap();
    static ref STATEMENT_PERIOD: Regex = Regex::new(
        r"(?i)periodo:?\s*del\s+(\d{2}/\d{2}/\d{4})\s+al\s+(\d{2}/\d{2}/\d{4})"
    ).unwrap();
    static ref CLOSING_BALANCE: Regex =
        Regex::new(r"(?i)saldo\s+final:?\s*(-?\s*\$?\s*[\d,]+\.\d{2})").unwrap();

    // 03/01   SPEI RECIBIDO ...      15,000.00     25,000.00
    static ref ACCOUNT_ROW: Regex = Regex::new(r"^\s*(\d{2})/(\d{2})\s+(\S.*)$").unwrap();
    static ref CELL_AMOUNT: Regex = Regex::new(r"-?[\d,]*\d\.\d{2}\b").unwrap();

    static ref CARD_NUMBER: Regex =
        Regex::new(r"(?i)n[uú]mero\s+de\s+tarjeta:?\s*[\dX* ]*(\d{4})\b").unwrap();
    static ref CUTOFF_DATE: Regex = Regex::new(r"(?i)fecha\s+de\s+corte:?\s*(\S+)").unwrap();
    static ref CARD_BALANCE: Regex =
        Regex::new(r"(?i)saldo\s+deudor\s+total:?\s*(\$?\s*[\d,]+\.\d{2})").unwrap();

    // 05-ENE-2023  AMAZON MX   + $1,299.00
    static ref CARD_ROW: Regex = Regex::new(
        r"^\s*(\d{1,2})-([A-Za-z]{3})-(\d{4})\s+(.+?)\s+([+-])\s*\$\s*([\d,]+\.\d{2})\s*$"
    ).unwrap();
}

/// BBVA checking account statement with CARGOS/ABONOS columns.
pub struct BbvaAccountStatement {
    tables: Arc<LookupTables>,
}

impl BbvaAccountStatement {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        Self { tables }
    }
}

impl Strategy for BbvaAccountStatement {
    fn name(&self) -> &'static str {
        "bbva_account_statement"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        let upper = content.to_uppercase();
        let is_statement = upper.contains(BANK)
            && upper.contains("ESTADO DE CUENTA")
            && upper.contains("CARGOS")
            && upper.contains("ABONOS")
            && !upper.contains("FECHA DE CORTE");
        if !is_statement {
            return MatchOutcome::NotMatched;
        }

        let account = capture(&ACCOUNT_NUMBER, content)
            .map(str::to_string)
            .or_else(|| extract_clabe(content).and_then(|clabe| account_from_clabe(&clabe)));
        let period = STATEMENT_PERIOD.captures(content);

        MatchOutcome::Matched(
            MatchContext::new()
                .with_optional("account", account)
                .with_optional("client", capture(&CLIENT_NUMBER, content).map(str::to_string))
                .with_optional("period_start", period.as_ref().map(|c| c[1].to_string()))
                .with_optional("period_end", period.as_ref().map(|c| c[2].to_string())),
        )
    }

    fn parse(&self, context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let account = context
            .property("account")
            .ok_or_else(|| ExtractionError::missing("No. de Cuenta"))?;
        let period_end = context
            .property("period_end")
            .ok_or_else(|| ExtractionError::missing("Periodo"))?;
        let period_end = parse_dmy(period_end, "Periodo")?;
        let period_start = context
            .property("period_start")
            .map(|raw| parse_dmy(raw, "Periodo"))
            .transpose()?;

        let transactions = account_ledger(content, period_end);
        debug!("Read {} movements for account {}", transactions.len(), account);

        let property = self.tables.property_for_account(account).map(str::to_string);
        if property.is_none() {
            warn!("Account {} has no property assigned", account);
        }

        let fields = SpecFields::default()
            .with_period(period_end.year(), period_end.month())
            .with_amount(labeled_amount(content, &CLOSING_BALANCE))
            .with_account(Some(account.to_string()))
            .with_property(property)
            .with_display(format!("{} {} {}", BANK, account, period_end.format("%Y-%m")));

        Ok(DocumentSpec::Statement(StatementSpec {
            fields,
            bank: BANK.to_string(),
            layout: StatementLayout::Account,
            client_number: context.property("client").map(str::to_string),
            period_start,
            period_end: Some(period_end),
            transactions,
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        statement_filename(self.name(), spec, original_name)
    }
}

/// BBVA credit card statement.
pub struct BbvaCardStatement;

impl BbvaCardStatement {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BbvaCardStatement {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for BbvaCardStatement {
    fn name(&self) -> &'static str {
        "bbva_card_statement"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        let upper = content.to_uppercase();
        if !(upper.contains(BANK) && upper.contains("TARJETA DE CR") && upper.contains("FECHA DE CORTE")) {
            return MatchOutcome::NotMatched;
        }

        MatchOutcome::Matched(
            MatchContext::new()
                .with_optional("card", capture(&CARD_NUMBER, content).map(str::to_string))
                .with_optional("cutoff", capture(&CUTOFF_DATE, content).map(str::to_string)),
        )
    }

    fn parse(&self, context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let raw_cutoff = context
            .property("cutoff")
            .ok_or_else(|| ExtractionError::missing("Fecha de corte"))?;
        let cutoff = parse_card_date(raw_cutoff)
            .ok_or_else(|| ExtractionError::parse("Fecha de corte", raw_cutoff))?;
        let card = context
            .property("card")
            .ok_or_else(|| ExtractionError::missing("Número de tarjeta"))?;

        let transactions = card_ledger(content);
        debug!("Read {} card movements for *{}", transactions.len(), card);

        let fields = SpecFields::default()
            .with_period(cutoff.year(), cutoff.month())
            .with_amount(labeled_amount(content, &CARD_BALANCE))
            .with_account(Some(card.to_string()))
            .with_display(format!("{} TDC {} {}", BANK, card, cutoff.format("%Y-%m")));

        Ok(DocumentSpec::Statement(StatementSpec {
            fields,
            bank: BANK.to_string(),
            layout: StatementLayout::Card,
            client_number: None,
            period_start: None,
            period_end: Some(cutoff),
            transactions,
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        statement_filename(self.name(), spec, original_name)
    }
}

fn statement_filename(
    strategy: &str,
    spec: &DocumentSpec,
    original_name: Option<&str>,
) -> Result<String, FilenameError> {
    let DocumentSpec::Statement(statement) = spec else {
        return Err(wrong_variant(strategy, DocumentType::Statement, spec));
    };
    let period = period_label(&statement.fields);
    let account = statement.fields.account_number.as_deref().unwrap_or("");
    let kind = match statement.layout {
        StatementLayout::Account => "",
        StatementLayout::Card => "TDC",
    };
    Ok(compose_filename(
        &[&period, &statement.bank, kind, account],
        original_name,
    ))
}

fn parse_dmy(raw: &str, concept: &str) -> Result<NaiveDate, ExtractionError> {
    NaiveDate::parse_from_str(raw, "%d/%m/%Y").map_err(|_| ExtractionError::parse(concept, raw))
}

/// `15-ENE-2023`
fn parse_card_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('-');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    parse_abbreviated_date(day, month, year)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Charge,
    Credit,
    Balance,
}

/// Right edges (in characters) of the amount columns of the ledger header.
struct LedgerColumns {
    edges: Vec<(Column, usize)>,
}

impl LedgerColumns {
    fn from_header(header: &str) -> Self {
        let edges = [
            (Column::Charge, "CARGOS"),
            (Column::Credit, "ABONOS"),
            (Column::Balance, "SALDO"),
        ]
        .into_iter()
        .filter_map(|(column, title)| {
            char_column(header, title).map(|start| (column, start + title.chars().count()))
        })
        .collect();
        Self { edges }
    }

    /// Column whose right edge is closest to `edge`.
    fn nearest(&self, edge: usize) -> Option<Column> {
        self.edges
            .iter()
            .min_by_key(|(_, column_edge)| column_edge.abs_diff(edge))
            .map(|(column, _)| *column)
    }

    fn entry(&self, line: &str, period_end: NaiveDate) -> Option<LedgerEntry> {
        let caps = ACCOUNT_ROW.captures(line)?;
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        // A January statement can list movements from late December.
        let year = if month > period_end.month() {
            period_end.year() - 1
        } else {
            period_end.year()
        };
        let date = NaiveDate::from_ymd_opt(year, month, day)?;

        let rest = caps.get(3)?;
        let mut description_end = line.len();
        let mut amount = None;
        let mut balance = None;

        for cell in CELL_AMOUNT.find_iter(rest.as_str()) {
            let start = rest.start() + cell.start();
            let end = rest.start() + cell.end();
            let Some(cents) = amount_to_cents(cell.as_str()) else {
                continue;
            };
            description_end = description_end.min(start);

            match self.nearest(line[..end].chars().count())? {
                Column::Charge => amount = Some(-cents.abs()),
                Column::Credit => amount = Some(cents.abs()),
                Column::Balance => balance = Some(cents),
            }
        }

        let entry = LedgerEntry {
            date,
            description: collapse_whitespace(&line[rest.start()..description_end]),
            amount: amount?,
            balance,
        };
        trace!("Ledger row {:?}", entry);
        Some(entry)
    }
}

fn account_ledger(content: &str, period_end: NaiveDate) -> Vec<LedgerEntry> {
    let lines: Vec<&str> = content.lines().collect();
    let Some(header_index) = lines.iter().position(|line| {
        let upper = line.to_uppercase();
        upper.contains("CARGOS") && upper.contains("ABONOS")
    }) else {
        return Vec::new();
    };

    let columns = LedgerColumns::from_header(&lines[header_index].to_uppercase());
    lines[header_index + 1..]
        .iter()
        .filter_map(|line| columns.entry(line, period_end))
        .collect()
}

/// Card rows carry an explicit sign: `+` is a charge, `-` a payment or refund.
fn card_ledger(content: &str) -> Vec<LedgerEntry> {
    content
        .lines()
        .filter_map(|line| {
            let caps = CARD_ROW.captures(line)?;
            let date = parse_abbreviated_date(&caps[1], &caps[2], &caps[3])?;
            let cents = amount_to_cents(&caps[6])?;
            Some(LedgerEntry {
                date,
                description: collapse_whitespace(&caps[4]),
                amount: if &caps[5] == "+" { -cents } else { cents },
                balance: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::strategies::fixtures;
    use pretty_assertions::assert_eq;

    fn row(date: &str, description: &str, charge: &str, credit: &str, balance: &str) -> String {
        format!("{date:<8}{description:<30}{charge:>12}{credit:>12}{balance:>12}")
    }

    fn account_statement(with_account_line: bool) -> String {
        let mut lines = vec![
            "BBVA MEXICO, S.A.".to_string(),
            "ESTADO DE CUENTA".to_string(),
            "MAESTRA PYME".to_string(),
        ];
        if with_account_line {
            lines.push("No. de Cuenta: 0123456789      No. de Cliente: B1234567".to_string());
        }
        lines.extend([
            "Periodo: DEL 01/01/2023 AL 31/01/2023".to_string(),
            "CLABE: 012180001234567899".to_string(),
            "Saldo Final: $23,766.00".to_string(),
            String::new(),
            row("OPER", "DESCRIPCION", "CARGOS", "ABONOS", "SALDO"),
            row("28/12", "COMISION ANUALIDAD", "500.00", "", "9,500.00"),
            row("03/01", "SPEI RECIBIDO CLIENTE", "", "15,000.00", "25,000.00"),
            row("10/01", "PAGO CFE", "1,234.00", "", "23,766.00"),
            "        REF 0001234".to_string(),
        ]);
        lines.join("\n")
    }

    fn parse(strategy: &dyn Strategy, content: &str) -> Result<DocumentSpec, ExtractionError> {
        match strategy.matches(content) {
            MatchOutcome::Matched(context) => strategy.parse(&context, content),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_account_statement() {
        let strategy = BbvaAccountStatement::new(fixtures::tables());
        let content = account_statement(true);
        let DocumentSpec::Statement(spec) = parse(&strategy, &content).unwrap() else {
            panic!("not a statement");
        };

        assert_eq!(spec.fields.year, Some(2023));
        assert_eq!(spec.fields.month, Some(1));
        assert_eq!(spec.fields.account_number.as_deref(), Some("0123456789"));
        assert_eq!(spec.fields.property_key.as_deref(), Some("casa-centro"));
        assert_eq!(spec.fields.amount, Some(2376600));
        assert_eq!(spec.client_number.as_deref(), Some("B1234567"));
        assert_eq!(spec.period_start, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(spec.layout, StatementLayout::Account);

        let movements: Vec<(NaiveDate, &str, i64, Option<i64>)> = spec
            .transactions
            .iter()
            .map(|t| (t.date, t.description.as_str(), t.amount, t.balance))
            .collect();
        assert_eq!(
            movements,
            vec![
                (NaiveDate::from_ymd_opt(2022, 12, 28).unwrap(), "COMISION ANUALIDAD", -50000, Some(950000)),
                (NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(), "SPEI RECIBIDO CLIENTE", 1500000, Some(2500000)),
                (NaiveDate::from_ymd_opt(2023, 1, 10).unwrap(), "PAGO CFE", -123400, Some(2376600)),
            ]
        );
    }

    #[test]
    fn test_account_falls_back_to_clabe() {
        let strategy = BbvaAccountStatement::new(fixtures::tables());
        let content = account_statement(false);
        let spec = parse(&strategy, &content).unwrap();
        assert_eq!(spec.fields().account_number.as_deref(), Some("00123456789"));
        assert_eq!(spec.fields().property_key, None);
    }

    #[test]
    fn test_account_statement_without_period_fails() {
        let strategy = BbvaAccountStatement::new(fixtures::tables());
        let content = account_statement(true).replace("Periodo: DEL 01/01/2023 AL 31/01/2023", "");
        assert_eq!(
            parse(&strategy, &content).unwrap_err(),
            ExtractionError::missing("Periodo")
        );
    }

    #[test]
    fn test_account_filename() {
        let strategy = BbvaAccountStatement::new(fixtures::tables());
        let content = account_statement(true);
        let spec = parse(&strategy, &content).unwrap();
        let name = strategy.suggest_filename(&spec, Some("estado.pdf")).unwrap();
        assert_eq!(name, "2023-01 BBVA 0123456789.pdf");
        assert_eq!(strategy.suggest_filename(&spec, Some("estado.pdf")).unwrap(), name);
    }

    const CARD: &str = "\
BBVA
TARJETA DE CRÉDITO AZUL
Número de tarjeta: 4152 31XX XXXX 1234
Fecha de corte: 15-ENE-2023
Saldo deudor total: $5,432.10

05-ENE-2023  AMAZON MEXICO                 + $1,299.00
09-ENE-2023  PAGO TARJETA - GRACIAS        - $3,000.00
12-DIC-2022  OXXO 1234                     +$45.50
";

    #[test]
    fn test_card_statement() {
        let strategy = BbvaCardStatement::new();
        assert!(matches!(strategy.matches(CARD), MatchOutcome::Matched(_)));
        assert_eq!(
            BbvaAccountStatement::new(fixtures::tables()).matches(CARD),
            MatchOutcome::NotMatched
        );

        let DocumentSpec::Statement(spec) = parse(&strategy, CARD).unwrap() else {
            panic!("not a statement");
        };
        assert_eq!(spec.layout, StatementLayout::Card);
        assert_eq!(spec.fields.year, Some(2023));
        assert_eq!(spec.fields.month, Some(1));
        assert_eq!(spec.fields.account_number.as_deref(), Some("1234"));
        assert_eq!(spec.fields.amount, Some(543210));

        let amounts: Vec<i64> = spec.transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![-129900, 300000, -4550]);
        assert_eq!(spec.transactions[1].description, "PAGO TARJETA - GRACIAS");
        assert_eq!(spec.transactions[2].date, NaiveDate::from_ymd_opt(2022, 12, 12).unwrap());

        let spec = DocumentSpec::Statement(spec);
        assert_eq!(
            strategy.suggest_filename(&spec, Some("tdc.PDF")).unwrap(),
            "2023-01 BBVA TDC 1234.pdf"
        );
    }

    #[test]
    fn test_card_bad_cutoff() {
        let strategy = BbvaCardStatement::new();
        let content = CARD.replace("15-ENE-2023", "15-XYZ-2023");
        assert_eq!(
            parse(&strategy, &content).unwrap_err(),
            ExtractionError::parse("Fecha de corte", "15-XYZ-2023")
        );
    }

    #[test]
    fn test_unrelated_text() {
        assert_eq!(
            BbvaAccountStatement::new(fixtures::tables()).matches("RECIBO CFE"),
            MatchOutcome::NotMatched
        );
        assert_eq!(BbvaCardStatement::new().matches("RECIBO CFE"), MatchOutcome::NotMatched);
    }
}
