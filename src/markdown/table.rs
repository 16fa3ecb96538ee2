//! Spreadsheet-grid rendering and shared table emission.
//!
//! The fixed-grid path lives with the block renderer (cell content comes
//! from the tree); the spreadsheet path here pulls everything from an
//! externally-resolved [`SheetSource`]. An unresolvable sheet is a valid,
//! expected state and degrades to a cached grid or an explicit
//! placeholder row instead of failing the document.

use tracing::warn;

use super::escape::{escape_cell, escape_html};
use crate::sheet::{CellStyle, SheetProvider, SheetSegment, SheetSource};

/// Foreground tokens that mean "normal text"; wrapping these would put
/// false color markup on every cell.
const DEFAULT_TEXT_COLORS: &[&str] = &[
    "#1f2329",
    "rgb(31, 35, 41)",
    "rgb(31,35,41)",
    "#000000",
    "rgb(0, 0, 0)",
    "rgb(0,0,0)",
    "inherit",
    "",
];

/// Emit Markdown table lines from row-major cell texts: one line per row,
/// with a dashed separator after row 0.
pub(crate) fn emit_rows(rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        lines.push(format!("| {} |", row.join(" | ")));
        if i == 0 {
            let dashes = vec!["---"; row.len()];
            lines.push(format!("| {} |", dashes.join(" | ")));
        }
    }
    lines.join("\n")
}

/// Render a spreadsheet-backed grid block.
///
/// The sheet ID is the token's trailing `_`-delimited segment, else
/// whatever the provider's record registry maps the block record to.
pub(crate) fn render_sheet(
    block_id: &str,
    token: &str,
    record_id: Option<&str>,
    cached_rows: Option<&[Vec<String>]>,
    provider: Option<&dyn SheetProvider>,
) -> String {
    let mut sheet_id = token
        .rsplit_once('_')
        .map(|(_, id)| id.to_string())
        .unwrap_or_default();
    if sheet_id.is_empty()
        && let (Some(provider), Some(record_id)) = (provider, record_id)
        && let Some(id) = provider.sheet_for_record(record_id)
    {
        sheet_id = id;
    }

    let Some(source) = provider.and_then(|p| p.sheet(&sheet_id)) else {
        if let Some(rows) = cached_rows {
            let rows: Vec<Vec<String>> = rows
                .iter()
                .map(|row| row.iter().map(|cell| escape_cell(cell)).collect())
                .collect();
            return emit_rows(&rows);
        }
        warn!(block = block_id, sheet = %sheet_id, "sheet data not loaded");
        return format!("> ⚠️ Sheet data not loaded (sheet {})", sheet_id);
    };

    let row_count = source.row_count();
    let col_count = source.col_count();
    if row_count == 0 || col_count == 0 {
        return String::new();
    }

    let mut rows = Vec::with_capacity(row_count);
    for r in 0..row_count {
        let mut cells = Vec::with_capacity(col_count);
        for c in 0..col_count {
            cells.push(render_sheet_cell(source, r, c));
        }
        rows.push(cells);
    }
    emit_rows(&rows)
}

fn render_sheet_cell(source: &dyn SheetSource, row: usize, col: usize) -> String {
    // Primary display value, then the secondary text accessor.
    let mut value = source
        .value(row, col)
        .or_else(|| source.text(row, col))
        .unwrap_or_default();

    if let Some(style) = source.style(row, col) {
        value = apply_cell_style(value, &style);
    }

    // A non-empty rich-text segment list overrides the plain value.
    if let Some(segments) = source.segments(row, col)
        && !segments.is_empty()
    {
        value = segments.iter().map(render_segment).collect();
    }

    escape_cell(&value)
}

/// Apply the sheet's primary cell style. Each marker is skipped when the
/// value already contains it, so pre-styled values are not double-wrapped.
fn apply_cell_style(mut value: String, style: &CellStyle) -> String {
    if style.strikethrough && !value.contains("~~") {
        value = format!("~~{}~~", value);
    }
    if style.bold && !value.contains("**") {
        value = format!("**{}**", value);
    }
    if style.italic && !value.contains('*') {
        value = format!("*{}*", value);
    }
    if let Some(bg) = background_color(style.back_color.as_deref())
        && !value.contains("<mark")
    {
        value = format!(
            "<mark style=\"background:{}\">{}</mark>",
            bg,
            escape_html(&value)
        );
    }
    if let Some(fg) = foreground_color(style.fore_color.as_deref())
        && !value.contains("<font")
    {
        value = format!("<font color=\"{}\">{}</font>", fg, escape_html(&value));
    }
    value
}

fn render_segment(segment: &SheetSegment) -> String {
    let mut text = segment.text.clone();
    let style = &segment.style;
    if style.strikethrough {
        text = format!("~~{}~~", text);
    }
    if style.bold {
        text = format!("**{}**", text);
    }
    if style.italic {
        text = format!("*{}*", text);
    }
    if let Some(fg) = foreground_color(style.fore_color.as_deref()) {
        text = format!("<font color=\"{}\">{}</font>", fg, escape_html(&text));
    }
    if let Some(bg) = background_color(style.back_color.as_deref()) {
        text = format!(
            "<mark style=\"background:{}\">{}</mark>",
            bg,
            escape_html(&text)
        );
    }
    text
}

fn foreground_color(token: Option<&str>) -> Option<&str> {
    token.filter(|c| !DEFAULT_TEXT_COLORS.contains(c))
}

fn background_color(token: Option<&str>) -> Option<&str> {
    token.filter(|c| !matches!(*c, "" | "inherit" | "transparent"))
}
