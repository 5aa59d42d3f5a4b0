use lazy_static::lazy_static;
use regex::Regex;

use super::{compose_filename, period_label, wrong_variant};
use crate::classify::strategy::{MatchContext, MatchOutcome, Strategy};
use crate::error::{ExtractionError, FilenameError};
use crate::models::{AnnotationSpec, DocumentSpec, DocumentType, SpecFields};
use crate::rules::collapse_whitespace;

lazy_static! {
    static ref NOTE_HEADER: Regex = Regex::new(r"(?i)^\s*nota\s+(\d{4})-(\d{2})\b(.*)$").unwrap();
}

/// Free-form text note whose first line is `NOTA yyyy-mm [title]`.
pub struct MonthlyNote;

impl MonthlyNote {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MonthlyNote {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for MonthlyNote {
    fn name(&self) -> &'static str {
        "note"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        let Some(first) = content.lines().find(|line| !line.trim().is_empty()) else {
            return MatchOutcome::NotMatched;
        };
        let Some(caps) = NOTE_HEADER.captures(first) else {
            return MatchOutcome::NotMatched;
        };

        let title = collapse_whitespace(&caps[3]);
        MatchOutcome::Matched(
            MatchContext::new()
                .with_property("year", &caps[1])
                .with_property("month", &caps[2])
                .with_optional("title", (!title.is_empty()).then_some(title)),
        )
    }

    fn parse(&self, context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let year_raw = context.require("year")?;
        let month_raw = context.require("month")?;
        let year: i32 = year_raw
            .parse()
            .map_err(|_| ExtractionError::parse("NOTA", year_raw))?;
        let month: u32 = month_raw
            .parse()
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| ExtractionError::parse("NOTA", format!("{year_raw}-{month_raw}")))?;

        let body: Vec<&str> = content
            .lines()
            .skip_while(|line| line.trim().is_empty())
            .skip(1)
            .collect();
        let body = collapse_whitespace(&body.join(" "));

        let display = match context.property("title") {
            Some(title) => format!("Nota {year}-{month:02} {title}"),
            None => format!("Nota {year}-{month:02}"),
        };

        Ok(DocumentSpec::Annotation(AnnotationSpec {
            fields: SpecFields::default()
                .with_period(year, month)
                .with_display(display)
                .with_description((!body.is_empty()).then_some(body)),
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        let DocumentSpec::Annotation(note) = spec else {
            return Err(wrong_variant(self.name(), DocumentType::Annotation, spec));
        };
        Ok(compose_filename(&[&period_label(&note.fields), "Nota"], original_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_note() {
        let content = "\n  NOTA 2023-04 Mantenimiento\nSe pagó por adelantado\n  el trimestre.\n";
        let strategy = MonthlyNote::new();
        let MatchOutcome::Matched(context) = strategy.matches(content) else {
            panic!("note not matched");
        };
        let spec = strategy.parse(&context, content).unwrap();

        assert_eq!(spec.year(), Some(2023));
        assert_eq!(spec.month(), Some(4));
        assert_eq!(
            spec.fields().display_filename.as_deref(),
            Some("Nota 2023-04 Mantenimiento")
        );
        assert_eq!(
            spec.fields().description.as_deref(),
            Some("Se pagó por adelantado el trimestre.")
        );
        assert_eq!(
            strategy.suggest_filename(&spec, Some("nota.txt")).unwrap(),
            "2023-04 Nota.txt"
        );
    }

    #[test]
    fn test_note_header_must_come_first() {
        let strategy = MonthlyNote::new();
        assert_eq!(strategy.matches("Recibo\nNOTA 2023-04"), MatchOutcome::NotMatched);
        assert_eq!(strategy.matches(""), MatchOutcome::NotMatched);
    }

    #[test]
    fn test_note_bad_month() {
        let strategy = MonthlyNote::new();
        let MatchOutcome::Matched(context) = strategy.matches("NOTA 2023-13") else {
            panic!("header not matched");
        };
        assert_eq!(
            strategy.parse(&context, "NOTA 2023-13").unwrap_err(),
            ExtractionError::parse("NOTA", "2023-13")
        );
    }
}
