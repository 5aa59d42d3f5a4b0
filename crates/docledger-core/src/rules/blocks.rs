//! Layout helpers for text produced by a column-preserving PDF converter.
//!
//! Tabular PDFs lose their real columns on conversion; what survives is the
//! character offset of each cell. These helpers re-slice lines by column.

use tracing::trace;

use super::patterns::WHITESPACE;

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Character column of `needle` within `line`.
pub fn char_column(line: &str, needle: &str) -> Option<usize> {
    line.find(needle).map(|byte| line[..byte].chars().count())
}

/// Slice `width` characters of `line` starting at character `column`.
pub fn slice_columns(line: &str, column: usize, width: usize) -> String {
    line.chars().skip(column).take(width).collect()
}

/// Extract the fixed-width block below `marker`.
///
/// Finds the first line containing `marker`, then takes `width` characters
/// starting at the marker's column from each of the `height` lines that
/// follow it. Each slice is trimmed, the slices are joined with spaces and
/// whitespace is collapsed. Returns `None` when the marker is absent or the
/// block is blank.
pub fn extract_block(text: &str, marker: &str, width: usize, height: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let (index, column) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| char_column(line, marker).map(|col| (i, col)))?;

    let parts: Vec<String> = lines
        .iter()
        .skip(index + 1)
        .take(height)
        .map(|line| slice_columns(line, column, width).trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();

    let block = collapse_whitespace(&parts.join(" "));
    trace!("Block under {:?} at line {}, column {}: {:?}", marker, index, column, block);

    if block.is_empty() { None } else { Some(block) }
}

/// Value printed after `label` on the same line, e.g. `No. de Cuenta: 123`.
///
/// Label matching ignores ASCII case; separators (`:` and spaces) after the
/// label are skipped and the rest of the line is whitespace-collapsed.
pub fn labeled_value(text: &str, label: &str) -> Option<String> {
    let label_lower = label.to_ascii_lowercase();

    text.lines().find_map(|line| {
        let lower = line.to_ascii_lowercase();
        let start = lower.find(&label_lower)? + label_lower.len();
        let value = line[start..].trim_start_matches(|c: char| c == ':' || c.is_whitespace());
        let value = collapse_whitespace(value);
        if value.is_empty() { None } else { Some(value) }
    })
}
