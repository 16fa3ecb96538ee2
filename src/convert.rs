//! Document assembly: render, normalize, title.

use memchr::memmem;
use tracing::debug;

use crate::error::{Error, Result};
use crate::images::ImagePlaceholder;
use crate::markdown::RenderContext;
use crate::sheet::SheetProvider;
use crate::tree::DocumentTree;

/// A converted document.
#[derive(Debug)]
pub struct Conversion {
    /// Normalized Markdown text, `#`-titled when a title was available,
    /// terminated with exactly one newline.
    pub markdown: String,
    /// Title used, from the tree's root text or the configured fallback.
    pub title: Option<String>,
    /// Image placeholders awaiting resolution.
    pub images: Vec<ImagePlaceholder>,
    /// Number of top-level blocks in the document.
    pub block_count: usize,
}

/// Converter configuration.
///
/// ```
/// use larkdown::{Converter, DocumentTree, tree::Block};
///
/// let mut tree = DocumentTree::new();
/// let p = tree.alloc(Block::text("Hello"));
/// tree.append_child(tree.root(), p);
///
/// let conversion = Converter::new()
///     .with_title("Notes")
///     .convert(Some(&tree))
///     .unwrap();
/// assert_eq!(conversion.markdown, "# Notes\n\nHello\n");
/// ```
#[derive(Default)]
pub struct Converter<'a> {
    title: Option<String>,
    sheets: Option<&'a dyn SheetProvider>,
}

impl<'a> Converter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback title, used when the tree's root carries no text of its own.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Resolved spreadsheet data for sheet blocks.
    pub fn with_sheets(mut self, sheets: &'a dyn SheetProvider) -> Self {
        self.sheets = Some(sheets);
        self
    }

    /// Convert a document tree to Markdown.
    ///
    /// Fails only when `tree` is absent; every per-block problem degrades
    /// to partial output instead.
    pub fn convert(&self, tree: Option<&DocumentTree>) -> Result<Conversion> {
        let tree = tree.ok_or(Error::SourceUnavailable)?;

        let mut ctx = RenderContext::new(tree);
        if let Some(sheets) = self.sheets {
            ctx = ctx.with_sheets(sheets);
        }
        let output = ctx.render();

        let title = tree.title().or_else(|| self.title.clone());
        let markdown = cleanup_markdown(&output.markdown, title.as_deref());

        let stats = MarkupStats::scan(&markdown);
        debug!(
            blocks = output.block_count,
            images = output.images.len(),
            pipes = stats.pipes,
            strikethrough = stats.strikethrough_pairs,
            font_spans = stats.font_spans,
            mark_spans = stats.mark_spans,
            "document converted"
        );

        Ok(Conversion {
            markdown,
            title,
            images: output.images,
            block_count: output.block_count,
        })
    }
}

/// Normalize rendered Markdown: strip trailing whitespace from lines, cap
/// blank-line runs at two, prepend the title heading when the text does not
/// already start with one, and end with exactly one newline.
fn cleanup_markdown(text: &str, title: Option<&str>) -> String {
    let mut lines = Vec::new();
    let mut blanks = 0usize;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blanks += 1;
            if blanks <= 2 {
                lines.push(line);
            }
        } else {
            blanks = 0;
            lines.push(line);
        }
    }

    let mut body = lines.join("\n").trim().to_string();
    if let Some(title) = title
        && !body.starts_with('#')
    {
        body = format!("# {}\n\n{}", title, body);
        let trimmed = body.trim_end().len();
        body.truncate(trimmed);
    }
    body.push('\n');
    body
}

/// Markup occurrence counts over the final text, for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MarkupStats {
    /// Literal `|` characters (table activity).
    pub pipes: usize,
    /// `~~` pairs.
    pub strikethrough_pairs: usize,
    /// `<font` span openings.
    pub font_spans: usize,
    /// `<mark` span openings.
    pub mark_spans: usize,
}

impl MarkupStats {
    pub fn scan(text: &str) -> Self {
        let bytes = text.as_bytes();
        Self {
            pipes: memchr::memchr_iter(b'|', bytes).count(),
            strikethrough_pairs: memmem::find_iter(bytes, "~~").count() / 2,
            font_spans: memmem::find_iter(bytes, "<font").count(),
            mark_spans: memmem::find_iter(bytes, "<mark").count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Block, BlockKind};

    #[test]
    fn test_missing_tree_fails() {
        let err = Converter::new().convert(None).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable));
    }

    #[test]
    fn test_title_from_root_text_wins() {
        let mut tree = DocumentTree::with_root(
            Block::new(BlockKind::Page).with_text("Root Title\n"),
        );
        let p = tree.alloc(Block::text("Body"));
        tree.append_child(tree.root(), p);
        let conversion = Converter::new()
            .with_title("Fallback")
            .convert(Some(&tree))
            .unwrap();
        assert_eq!(conversion.title.as_deref(), Some("Root Title"));
        assert_eq!(conversion.markdown, "# Root Title\n\nBody\n");
    }

    #[test]
    fn test_no_title_prepend_when_text_starts_with_heading() {
        let mut tree = DocumentTree::new();
        let h = tree.alloc(Block::new(BlockKind::Heading(1)).with_text("Already"));
        tree.append_child(tree.root(), h);
        let conversion = Converter::new()
            .with_title("Unused")
            .convert(Some(&tree))
            .unwrap();
        assert_eq!(conversion.markdown, "# Already\n");
    }

    #[test]
    fn test_cleanup_collapses_blank_runs() {
        let out = cleanup_markdown("a\n\n\n\n\n\nb   \n", None);
        assert_eq!(out, "a\n\n\nb\n");
    }

    #[test]
    fn test_cleanup_empty_body_with_title() {
        assert_eq!(cleanup_markdown("", Some("T")), "# T\n");
        assert_eq!(cleanup_markdown("\n\n", Some("T")), "# T\n");
    }

    #[test]
    fn test_block_count_is_root_child_count() {
        let mut tree = DocumentTree::new();
        for text in ["a", "b", "c"] {
            let id = tree.alloc(Block::text(text));
            tree.append_child(tree.root(), id);
        }
        let conversion = Converter::new().convert(Some(&tree)).unwrap();
        assert_eq!(conversion.block_count, 3);
    }

    #[test]
    fn test_markup_stats_scan() {
        let stats = MarkupStats::scan("| a | ~~x~~ <font color=\"#f00\">y</font> <mark>z</mark>");
        assert_eq!(stats.pipes, 3);
        assert_eq!(stats.strikethrough_pairs, 1);
        assert_eq!(stats.font_spans, 1);
        assert_eq!(stats.mark_spans, 1);
    }
}
