//! Layout table finder: recover raw tables from positioned text chunks.
//!
//! Report tables are typeset as aligned columns. The pdfium backend turns a
//! page's characters into chunks (runs of characters with no wide horizontal
//! gap), and this module groups chunks into rows by baseline and rows into
//! tables by column alignment:
//!
//! 1. Rows: chunks whose tops are within `row_tolerance` share a row.
//! 2. A row with at least `min_columns` chunks opens a table; its chunks are
//!    the column anchors (the header).
//! 3. Following rows continue the table while they have at least
//!    `min_columns` chunks and most of them align with an anchor
//!    (horizontal overlap, or left edges within `column_tolerance`).
//! 4. Each chunk lands in the anchor it overlaps most; chunks sharing a cell
//!    are joined with a space. Missing cells are `None`.
//!
//! Everything here works in PDF user space (points, y grows upwards) and is
//! independent of pdfium so it can be tested with synthetic chunks.

use crate::sections::RawTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A run of characters on one line with no wide gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextChunk {
    fn overlap(&self, other: &TextChunk) -> f32 {
        (self.right.min(other.right) - self.left.max(other.left)).max(0.0)
    }
}

/// Tolerances for the finder. The defaults suit 9–12 pt body text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    /// Maximum top-edge difference (points) within one row.
    pub row_tolerance: f32,
    /// Maximum left-edge difference (points) for a chunk to align with an anchor.
    pub column_tolerance: f32,
    /// Rows, header included, needed to emit a table.
    pub min_rows: usize,
    /// Chunks a row needs to count as a table row.
    pub min_columns: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            column_tolerance: 6.0,
            min_rows: 2,
            min_columns: 2,
        }
    }
}

/// Group chunks into rows, top of page first, each row sorted left to right.
pub fn group_rows(chunks: &[TextChunk], row_tolerance: f32) -> Vec<Vec<TextChunk>> {
    let mut sorted: Vec<&TextChunk> = chunks.iter().filter(|c| !c.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| b.top.total_cmp(&a.top).then(a.left.total_cmp(&b.left)));

    let mut rows: Vec<Vec<TextChunk>> = Vec::new();
    let mut row_top = f32::NAN;
    for chunk in sorted {
        let same_row = (row_top - chunk.top).abs() <= row_tolerance;
        if let Some(row) = rows.last_mut().filter(|_| same_row) {
            row.push(chunk.clone());
            continue;
        }
        row_top = chunk.top;
        rows.push(vec![chunk.clone()]);
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.left.total_cmp(&b.left));
    }
    rows
}

/// Find every aligned table among `chunks`.
pub fn find_tables(chunks: &[TextChunk], options: &LayoutOptions) -> Vec<RawTable> {
    let rows = group_rows(chunks, options.row_tolerance);
    let mut tables = Vec::new();
    let mut i = 0;

    while i < rows.len() {
        let header = &rows[i];
        if header.len() < options.min_columns {
            i += 1;
            continue;
        }

        let mut body_end = i + 1;
        while body_end < rows.len() && continues_table(header, &rows[body_end], options) {
            body_end += 1;
        }

        let row_count = body_end - i;
        if row_count >= options.min_rows {
            debug!(
                "Layout table: {} rows x {} columns starting at y={:.1}",
                row_count,
                header.len(),
                header[0].top
            );
            tables.push(build_table(header, &rows[i..body_end]));
            i = body_end;
        } else {
            i += 1;
        }
    }

    tables
}

fn aligns_with(chunk: &TextChunk, anchor: &TextChunk, tolerance: f32) -> bool {
    chunk.overlap(anchor) > 0.0 || (chunk.left - anchor.left).abs() <= tolerance
}

fn continues_table(header: &[TextChunk], row: &[TextChunk], options: &LayoutOptions) -> bool {
    if row.len() < options.min_columns {
        return false;
    }
    let aligned = row
        .iter()
        .filter(|c| header.iter().any(|a| aligns_with(c, a, options.column_tolerance)))
        .count();
    aligned * 2 >= row.len()
}

/// Index of the anchor a chunk belongs to: most overlap, else nearest left edge.
fn column_for(chunk: &TextChunk, header: &[TextChunk]) -> usize {
    let best_overlap = header
        .iter()
        .enumerate()
        .map(|(i, a)| (i, chunk.overlap(a)))
        .filter(|(_, o)| *o > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((i, _)) = best_overlap {
        return i;
    }
    header
        .iter()
        .enumerate()
        .min_by(|a, b| {
            (a.1.left - chunk.left)
                .abs()
                .total_cmp(&(b.1.left - chunk.left).abs())
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn build_table(header: &[TextChunk], rows: &[Vec<TextChunk>]) -> RawTable {
    let width = header.len();
    let grid = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<Option<String>> = vec![None; width];
            for chunk in row {
                let text = chunk.text.trim();
                let cell = &mut cells[column_for(chunk, header)];
                match cell {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(text);
                    }
                    None => *cell = Some(text.to_string()),
                }
            }
            cells
        })
        .collect();
    RawTable::new(grid)
}
