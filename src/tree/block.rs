//! Block node types and kinds.

use crate::inline::InlineRun;

/// Unique identifier for a block within a [`DocumentTree`](super::DocumentTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    /// The root block ID (always 0).
    pub const ROOT: BlockId = BlockId(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Embedded image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Opaque token identifying the image with the source editor.
    pub token: String,
    /// Display name, used as the Markdown alt text.
    pub name: String,
    /// Whether the snapshot had a fetch capability attached to the block.
    /// Non-fetchable images render with an empty target and are never
    /// recorded for the resolution pass.
    pub fetchable: bool,
}

/// Kind of a content block, carrying the fields relevant to that kind.
///
/// Kinds map to Markdown concepts during rendering; unrecognized editor
/// types keep their tag and degrade to plain text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BlockKind {
    /// Document root.
    Page,
    /// Heading with level 1-9. Levels 7-9 exceed Markdown's range and
    /// render as plain paragraph text.
    Heading(u8),
    /// Plain paragraph.
    #[default]
    Text,
    /// Thematic break.
    Divider,
    /// Fenced code block. The language tag is lower-cased at parse time.
    Code { language: String },
    /// Quote container; children render behind `> ` markers.
    Quote,
    /// Callout container; rendered like a quote.
    Callout,
    /// Bulleted list item.
    Bullet,
    /// Ordered list item. `seq` is the explicit sequence number when the
    /// editor recorded a numeric one; `None` means "auto".
    Ordered { seq: Option<u64> },
    /// Checklist item.
    Todo { done: bool },
    /// Fixed-grid table with a declared column count. Children are the
    /// cells in row-major order.
    Table { columns: usize },
    /// Spreadsheet-backed grid. The token identifies the backing sheet;
    /// `cached_rows` is an optional previously-materialized plain grid
    /// used when the sheet data cannot be resolved.
    Sheet {
        token: String,
        record_id: Option<String>,
        cached_rows: Option<Vec<Vec<String>>>,
    },
    /// Embedded image. `None` when the block carried no image payload.
    Image(Option<ImageRef>),
    /// Multi-column layout; each child is a column container.
    Grid,
    /// Embedded frame.
    Iframe { url: Option<String> },
    /// Diagram with raw source text (e.g. mermaid).
    Diagram { source: Option<String> },
    /// Reference that inlines another block's children in place.
    SyncedSource,
    /// Expandable heading: emitted like a paragraph, children spliced
    /// after it during flattening.
    ToggleHeading,
    /// Unrecognized editor type; the original tag is kept for diagnostics.
    Unknown(String),
}

/// One node of the document tree.
///
/// Structure (parent and children) lives in the tree arena; a block itself
/// is pure content.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// Editor-assigned block ID.
    pub id: String,
    /// Block kind with its kind-specific fields.
    pub kind: BlockKind,
    /// Ordered styled runs of inline content, when the snapshot carried
    /// them. `Some(vec![])` is distinct from `None`: present-but-empty
    /// content suppresses the plain-text fallback.
    pub runs: Option<Vec<InlineRun>>,
    /// Plain-text fallback for the block content. A trailing newline is
    /// stripped on use.
    pub all_text: Option<String>,
}

impl Block {
    /// Create a block of the given kind with no content.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Create a plain paragraph block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Text,
            all_text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Set the styled runs.
    pub fn with_runs(mut self, runs: Vec<InlineRun>) -> Self {
        self.runs = Some(runs);
        self
    }

    /// Set the plain-text fallback.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.all_text = Some(text.into());
        self
    }
}
