//! Currency amount parsing into integer cents.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::patterns::MONEY;

/// Convert a currency string into cents.
///
/// Thousands separators, currency symbols and spaces are dropped; the
/// remaining decimal value is multiplied by 100 and truncated, so
/// `"300,000"` yields `30000000` and `"1,234.567"` yields `123456`.
pub fn amount_to_cents(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let value = Decimal::from_str(&cleaned).ok()?;
    value.checked_mul(Decimal::ONE_HUNDRED)?.trunc().to_i64()
}

/// Find the first amount captured by `pattern` (group 1) and convert it.
pub fn labeled_amount(text: &str, pattern: &Regex) -> Option<i64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| amount_to_cents(m.as_str()))
}

/// Return every money token in `text` converted to cents, with its span.
pub fn money_tokens(text: &str) -> Vec<(i64, usize, usize)> {
    MONEY
        .find_iter(text)
        .filter_map(|m| amount_to_cents(m.as_str()).map(|c| (c, m.start(), m.end())))
        .collect()
}

/// Format cents as `1,234.56`.
pub fn format_cents(cents: i64) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let integer = (abs / 100).to_string();
    let decimals = abs % 100;

    let chars: Vec<char> = integer.chars().collect();
    let mut grouped = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("{}{}.{:02}", if negative { "-" } else { "" }, grouped, decimals)
}
