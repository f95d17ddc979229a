//! Paginated plain-text rendering of the reading table.
//!
//! Export only; the output is meant for reading and printing, not parsing.
//! Long descriptions wrap onto continuation lines within their row, so every
//! character of the input is listed.

use crate::table::{TableRow, HEADERS};
use chrono::NaiveDateTime;

/// Form feed between pages
pub const PAGE_BREAK: char = '\u{c}';

/// Widest the description column grows before wrapping
const DESCRIPTION_WIDTH: usize = 40;

/// One table row as printed: a first line plus any wrapped description lines
type DisplayRow = Vec<[String; 8]>;

#[derive(Clone, Debug)]
pub struct DocumentOptions {
    pub title: String,
    pub rows_per_page: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            title: "Blood Sugar History".into(),
            rows_per_page: 40,
        }
    }
}

/// A rendered document, one string per page
#[derive(Clone, Debug)]
pub struct Document {
    pub pages: Vec<String>,
}

impl Document {
    pub fn to_text(&self) -> String {
        let separator = format!("{}\n", PAGE_BREAK);
        self.pages.join(&separator)
    }
}

/// Render rows into pages with a title and generation timestamp on each page
pub fn render_document(
    rows: &[TableRow],
    generated_at: NaiveDateTime,
    options: &DocumentOptions,
) -> Document {
    let display: Vec<DisplayRow> = rows.iter().map(display_row).collect();
    let widths = column_widths(&display);

    let per_page = options.rows_per_page.max(1);
    let chunks: Vec<&[DisplayRow]> = if display.is_empty() {
        vec![display.as_slice()]
    } else {
        display.chunks(per_page).collect()
    };
    let total = chunks.len();

    let pages = chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut page = String::new();
            page.push_str(&options.title);
            page.push('\n');
            page.push_str(&format!(
                "Exported at: {}\n",
                generated_at.format("%Y-%m-%d %H:%M:%S")
            ));
            page.push_str(&format!("Page {} of {}\n\n", i + 1, total));

            page.push_str(&border('┌', '┬', '┐', &widths));
            page.push_str(&line(HEADERS.iter().copied(), &widths));
            page.push_str(&border('├', '┼', '┤', &widths));
            if chunk.is_empty() {
                page.push_str("(no readings)\n");
            }
            for row in chunk.iter().flatten() {
                page.push_str(&line(row.iter().map(String::as_str), &widths));
            }
            page.push_str(&border('└', '┴', '┘', &widths));
            page
        })
        .collect();

    Document { pages }
}

fn display_row(row: &TableRow) -> DisplayRow {
    let mut first = row.cells().map(|cell| cell.replace(['\n', '\r'], " "));
    let mut description = wrap(&std::mem::take(&mut first[7]), DESCRIPTION_WIDTH).into_iter();
    first[7] = description.next().unwrap_or_default();

    let mut lines = vec![first];
    for rest in description {
        let mut continuation: [String; 8] = Default::default();
        continuation[7] = rest;
        lines.push(continuation);
    }
    lines
}

/// Break text into lines of at most `width` characters, at spaces where possible.
///
/// Concatenating the lines gives back the input exactly: the space a line
/// breaks on stays at the end of that line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();

    while rest.len() > width {
        let cut = rest[..=width]
            .iter()
            .rposition(|c| *c == ' ')
            .filter(|&pos| pos > 0)
            .map_or(width, |pos| pos.min(width - 1) + 1);
        lines.push(rest.drain(..cut).collect());
    }
    lines.push(rest.into_iter().collect());
    lines
}

fn column_widths(rows: &[DisplayRow]) -> [usize; 8] {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in rows.iter().flatten() {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

fn border(left: char, mid: char, right: char, widths: &[usize; 8]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}\n", left, segments.join(&mid.to_string()), right)
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize; 8]) -> String {
    let padded: Vec<String> = cells
        .zip(widths.iter())
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!(" {}{} ", cell, " ".repeat(pad))
        })
        .collect();
    format!("│{}│\n", padded.join("│"))
}
