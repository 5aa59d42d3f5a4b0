//! Date extraction and Spanish month-name tables.

use chrono::NaiveDate;

use super::FieldExtractor;
use super::patterns::{DATE_ABBREVIATED, DATE_DMY, DATE_ISO, DATE_LONG};

/// Date field extractor covering the formats printed on Mexican documents.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = NaiveDate;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<(usize, NaiveDate)> = Vec::new();

        // 15/01/2023
        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);
            if let (Some(date), Some(m)) = (NaiveDate::from_ymd_opt(year, month, day), caps.get(0)) {
                results.push((m.start(), date));
            }
        }

        // 15-ENE-2023, 15 ENE 23
        for caps in DATE_ABBREVIATED.captures_iter(text) {
            if let (Some(date), Some(m)) = (
                parse_abbreviated_date(&caps[1], &caps[2], &caps[3]),
                caps.get(0),
            ) {
                results.push((m.start(), date));
            }
        }

        // 15 de enero de 2023
        for caps in DATE_LONG.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);
            let date = month_from_name(&caps[2])
                .and_then(|month| NaiveDate::from_ymd_opt(year, month, day));
            if let (Some(date), Some(m)) = (date, caps.get(0)) {
                results.push((m.start(), date));
            }
        }

        // 2023-01-15
        for caps in DATE_ISO.captures_iter(text) {
            if let (Some(date), Some(m)) = (parse_iso_date(&caps[0]), caps.get(0)) {
                results.push((m.start(), date));
            }
        }

        // Text order, not format order
        results.sort_by_key(|(pos, _)| *pos);
        results.into_iter().map(|(_, date)| date).collect()
    }
}

/// First date found in `text`, in any supported format.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    DateExtractor::new().extract(text)
}

/// Parse `yyyy-mm-dd`, ignoring any trailing time component.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Build a date from day, 3-letter Spanish month and a 2- or 4-digit year.
pub fn parse_abbreviated_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day: u32 = day.trim().parse().ok()?;
    let month = month_from_abbreviation(month)?;
    let year = expand_year(year.trim().parse().ok()?);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Two-digit years are taken as 20xx.
pub fn expand_year(year: i32) -> i32 {
    if year < 100 { 2000 + year } else { year }
}

/// Spanish month name to number, ignoring case and accents.
pub fn month_from_name(name: &str) -> Option<u32> {
    let normalized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect();

    match normalized.as_str() {
        "enero" => Some(1),
        "febrero" => Some(2),
        "marzo" => Some(3),
        "abril" => Some(4),
        "mayo" => Some(5),
        "junio" => Some(6),
        "julio" => Some(7),
        "agosto" => Some(8),
        "septiembre" | "setiembre" => Some(9),
        "octubre" => Some(10),
        "noviembre" => Some(11),
        "diciembre" => Some(12),
        _ => None,
    }
}

/// 3-letter Spanish month abbreviation to number.
pub fn month_from_abbreviation(abbr: &str) -> Option<u32> {
    match abbr.trim().to_uppercase().as_str() {
        "ENE" => Some(1),
        "FEB" => Some(2),
        "MAR" => Some(3),
        "ABR" => Some(4),
        "MAY" => Some(5),
        "JUN" => Some(6),
        "JUL" => Some(7),
        "AGO" => Some(8),
        "SEP" | "SET" => Some(9),
        "OCT" => Some(10),
        "NOV" => Some(11),
        "DIC" => Some(12),
        _ => None,
    }
}
