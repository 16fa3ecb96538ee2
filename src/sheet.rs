//! External spreadsheet data.
//!
//! Spreadsheet blocks only carry a token; the cell data lives outside the
//! document tree. Callers that have fetched it implement [`SheetSource`]
//! (one sheet) and [`SheetProvider`] (lookup by sheet ID or block record),
//! and hand the provider to the renderer.

/// Cell-level formatting attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    /// CSS color token, e.g. `#ff0000` or `rgb(31, 35, 41)`.
    pub fore_color: Option<String>,
    pub back_color: Option<String>,
}

/// One styled span of a rich-text cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSegment {
    pub text: String,
    pub style: CellStyle,
}

/// Read access to a single resolved sheet.
///
/// `value` is the primary display value; `text` is a secondary accessor
/// consulted when `value` is absent. `style` and `segments` are optional
/// richness; the default implementations return nothing.
pub trait SheetSource {
    fn row_count(&self) -> usize;
    fn col_count(&self) -> usize;

    fn value(&self, row: usize, col: usize) -> Option<String>;

    fn text(&self, _row: usize, _col: usize) -> Option<String> {
        None
    }

    fn style(&self, _row: usize, _col: usize) -> Option<CellStyle> {
        None
    }

    /// Rich-text spans for the cell. A non-empty result replaces the
    /// plain value entirely.
    fn segments(&self, _row: usize, _col: usize) -> Option<Vec<SheetSegment>> {
        None
    }
}

/// Lookup of resolved sheets for a document.
pub trait SheetProvider {
    fn sheet(&self, sheet_id: &str) -> Option<&dyn SheetSource>;

    /// Map a spreadsheet block's record ID to a sheet ID, for blocks whose
    /// token does not encode one.
    fn sheet_for_record(&self, _record_id: &str) -> Option<String> {
        None
    }
}
