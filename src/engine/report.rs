//! Aggregate summary rendering: a plain table for the terminal, JSON for scripts.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::Summary;

const HEADERS: [&str; 6] = ["Language", "Files", "Lines", "Code", "Comments", "Blanks"];

/// Table with one row per language (name order) and a total row. Empty summaries render the
/// header and a zero total.
pub fn render_table(summary: &Summary) -> String {
    let rows: Vec<[String; 6]> = summary
        .iter()
        .map(|(language, s)| {
            [
                language.to_string(),
                s.files.to_string(),
                s.counts.lines.to_string(),
                s.counts.code.to_string(),
                s.counts.comment.to_string(),
                s.counts.blank.to_string(),
            ]
        })
        .collect();
    let total = summary.total();
    let total_row = [
        "Total".to_string(),
        total.files.to_string(),
        total.counts.lines.to_string(),
        total.counts.code.to_string(),
        total.counts.comment.to_string(),
        total.counts.blank.to_string(),
    ];

    let mut widths = HEADERS.map(str::len);
    for row in rows.iter().chain(std::iter::once(&total_row)) {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    let rule = "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1));

    let mut out = String::new();
    out.push_str(&format_row(&HEADERS.map(String::from), &widths).bold().to_string());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    for row in &rows {
        out.push_str(&format_row(row, &widths));
        out.push('\n');
    }
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format_row(&total_row, &widths).green().to_string());
    out.push('\n');
    out
}

/// First column left-aligned, numbers right-aligned.
fn format_row(cells: &[String; 6], widths: &[usize; 6]) -> String {
    cells
        .iter()
        .zip(widths.iter())
        .enumerate()
        .map(|(i, (cell, w))| {
            if i == 0 {
                format!("{:<w$}", cell, w = *w)
            } else {
                format!("{:>w$}", cell, w = *w)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Pretty JSON: `{"languages": {...}, "total": {...}}`.
pub fn render_json(summary: &Summary) -> Result<String> {
    let value = serde_json::json!({
        "languages": summary,
        "total": summary.total(),
    });
    serde_json::to_string_pretty(&value).context("serialize summary")
}
