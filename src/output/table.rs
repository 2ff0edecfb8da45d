//! Record tables for list results and field listings for single records.

use super::colors::*;
use crate::api::{value_text, FormData};
use crate::pages::{ColumnSpec, FieldSpec};

/// Terminal column width of `s`, counting CJK and fullwidth characters as two.
pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

fn char_width(c: char) -> usize {
    match c as u32 {
        0x1100..=0x115F | 0x2E80..=0xA4CF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60 | 0xFFE0..=0xFFE6 => 2,
        _ => 1,
    }
}

/// Pad or truncate `s` to exactly `width` columns.
pub fn fit(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    let total = display_width(s);
    for c in s.chars() {
        let w = char_width(c);
        // Leave room for the ellipsis when truncating.
        let budget = if total > width { width.saturating_sub(1) } else { width };
        if used + w > budget {
            out.push('…');
            used += 1;
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn cell(row: &FormData, key: &str) -> String {
    row.get(key).map(value_text).unwrap_or_default()
}

/// Render `rows` under `columns` as plain lines, header first.
pub fn render_rows(columns: &[ColumnSpec], rows: &[FormData]) -> Vec<String> {
    let header = columns
        .iter()
        .map(|c| fit(c.title, usize::from(c.width)))
        .collect::<Vec<_>>()
        .join("  ");
    let mut lines = vec![header.trim_end().to_string()];
    for row in rows {
        let line = columns
            .iter()
            .map(|c| fit(&cell(row, c.data_index), usize::from(c.width)))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines
}

pub fn print_rows(columns: &[ColumnSpec], rows: &[FormData]) {
    let lines = render_rows(columns, rows);
    if let Some((header, body)) = lines.split_first() {
        println!("{BOLD}{}{RESET}", header);
        if body.is_empty() {
            println!("{DIM}(no records){RESET}");
        }
        for line in body {
            println!("{}", line);
        }
    }
}

pub fn print_page_summary(page: u32, page_count: u32, total: u64) {
    println!("{GRAY}page {}/{} · {} total{RESET}", page, page_count, total);
}

/// Print `record` as `label: value` lines in form order, followed by any
/// fields the form does not declare.
pub fn print_record(fields: &[FieldSpec], record: &FormData) {
    let width = fields.iter().map(|f| display_width(f.label)).max().unwrap_or(0);
    for field in fields {
        let pad = width - display_width(field.label);
        println!(
            "{CYAN}{}{}{RESET}  {}",
            field.label,
            " ".repeat(pad),
            cell(record, field.name)
        );
    }
    for (key, value) in record {
        if !fields.iter().any(|f| f.name == key.as_str()) {
            println!("{GRAY}{}{RESET}  {}", key, value_text(value));
        }
    }
}
