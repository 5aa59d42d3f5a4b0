//! Subcommands and the output formatting they share.

pub mod batch;
pub mod classify;
pub mod config;

use docledger_core::rules::format_cents;
use docledger_core::DocumentSpec;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn format_spec(spec: &DocumentSpec, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(spec)?),
        OutputFormat::Csv => format_spec_csv(spec),
        OutputFormat::Text => Ok(format_spec_text(spec)),
    }
}

fn format_spec_csv(spec: &DocumentSpec) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let fields = spec.fields();

    wtr.write_record([
        "type",
        "year",
        "month",
        "amount",
        "account_number",
        "property_key",
        "display_filename",
        "suggested_filename",
        "description",
    ])?;

    let row: Vec<String> = vec![
        spec.document_type().as_str().to_string(),
        fields.year.map(|y| y.to_string()).unwrap_or_default(),
        fields.month.map(|m| m.to_string()).unwrap_or_default(),
        fields.amount.map(format_cents).unwrap_or_default(),
        fields.account_number.clone().unwrap_or_default(),
        fields.property_key.clone().unwrap_or_default(),
        fields.display_filename.clone().unwrap_or_default(),
        fields.suggested_filename.clone().unwrap_or_default(),
        fields.description.clone().unwrap_or_default(),
    ];
    wtr.write_record(&row)?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_spec_text(spec: &DocumentSpec) -> String {
    let fields = spec.fields();
    let mut output = String::new();

    output.push_str(&format!("Type: {}\n", spec.document_type().as_str()));
    match (fields.year, fields.month) {
        (Some(year), Some(month)) => output.push_str(&format!("Period: {year}-{month:02}\n")),
        (Some(year), None) => output.push_str(&format!("Period: {year}\n")),
        _ => {}
    }
    if let Some(amount) = fields.amount {
        output.push_str(&format!("Amount: {}\n", format_cents(amount)));
    }
    if let Some(account) = &fields.account_number {
        output.push_str(&format!("Account: {account}\n"));
    }
    if let Some(property) = &fields.property_key {
        output.push_str(&format!("Property: {property}\n"));
    }
    if let Some(display) = &fields.display_filename {
        output.push_str(&format!("Display: {display}\n"));
    }
    if let Some(filename) = &fields.suggested_filename {
        output.push_str(&format!("Suggested filename: {filename}\n"));
    }
    if let Some(description) = &fields.description {
        output.push_str(&format!("\n{description}\n"));
    }

    output
}
