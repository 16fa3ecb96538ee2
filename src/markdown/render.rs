//! Recursive block-tree rendering.
//!
//! [`RenderContext`] walks the tree once and produces the Markdown body
//! plus the side list of image placeholders for the resolution pass.
//! Rendering is pure and synchronous; per-block problems degrade to empty
//! output for that block rather than failing the document.

use std::collections::HashSet;

use super::escape::escape_cell;
use super::numbering::ordinal_for;
use super::table;
use crate::images::{IMAGE_TOKEN_PREFIX, ImagePlaceholder};
use crate::inline::compose_runs;
use crate::sheet::SheetProvider;
use crate::tree::{BlockId, BlockKind, DocumentTree};

/// Rendered document body with its side products.
#[derive(Debug, Default)]
pub struct RenderOutput {
    /// Markdown body, not yet whitespace-normalized.
    pub markdown: String,
    /// Image placeholders emitted into the text, in appearance order.
    pub images: Vec<ImagePlaceholder>,
    /// Number of top-level blocks under the root.
    pub block_count: usize,
}

/// One rendering pass over a document tree.
pub struct RenderContext<'a> {
    tree: &'a DocumentTree,
    sheets: Option<&'a dyn SheetProvider>,
    images: Vec<ImagePlaceholder>,
}

impl<'a> RenderContext<'a> {
    pub fn new(tree: &'a DocumentTree) -> Self {
        Self {
            tree,
            sheets: None,
            images: Vec::new(),
        }
    }

    /// Attach resolved spreadsheet data for sheet blocks.
    pub fn with_sheets(mut self, sheets: &'a dyn SheetProvider) -> Self {
        self.sheets = Some(sheets);
        self
    }

    /// Render the whole tree, consuming the context.
    pub fn render(mut self) -> RenderOutput {
        let root = self.tree.root();
        let block_count = self.tree.children(root).len();
        let markdown = self.render_block(root, 0);
        RenderOutput {
            markdown,
            images: self.images,
            block_count,
        }
    }

    /// Normalize a child list for rendering: synced references are inlined
    /// recursively, and headings, paragraphs and expandable headings that
    /// carry children are emitted followed by their flattened children.
    /// The pass is idempotent; a block never appears twice.
    pub(crate) fn flatten(&self, ids: &[BlockId]) -> Vec<BlockId> {
        let mut out = Vec::with_capacity(ids.len());
        let mut seen = HashSet::new();
        self.flatten_into(ids, &mut out, &mut seen);
        out
    }

    fn flatten_into(&self, ids: &[BlockId], out: &mut Vec<BlockId>, seen: &mut HashSet<BlockId>) {
        for &id in ids {
            let kind = self.tree.block(id).map(|b| &b.kind);
            match kind {
                Some(BlockKind::SyncedSource) => {
                    self.flatten_into(self.tree.children(id), out, seen);
                }
                Some(
                    BlockKind::Heading(_) | BlockKind::Text | BlockKind::ToggleHeading,
                ) => {
                    if seen.insert(id) {
                        out.push(id);
                    }
                    self.flatten_into(self.tree.children(id), out, seen);
                }
                Some(_) => {
                    if seen.insert(id) {
                        out.push(id);
                    }
                }
                None => {}
            }
        }
    }

    /// Inline content of a block: styled runs when present, else the
    /// plain-text fallback with its trailing newline stripped.
    fn block_text(&self, id: BlockId) -> String {
        let Some(block) = self.tree.block(id) else {
            return String::new();
        };
        if let Some(runs) = &block.runs {
            return compose_runs(runs);
        }
        block
            .all_text
            .as_deref()
            .map(|t| t.strip_suffix('\n').unwrap_or(t).to_string())
            .unwrap_or_default()
    }

    /// Raw code text: plain-text fallback, else run texts concatenated
    /// with styles ignored, else children's text joined with newlines.
    fn code_text(&self, id: BlockId) -> String {
        let Some(block) = self.tree.block(id) else {
            return String::new();
        };
        if let Some(text) = &block.all_text
            && !text.is_empty()
        {
            return text.strip_suffix('\n').unwrap_or(text).to_string();
        }
        if let Some(runs) = &block.runs {
            let joined: String = runs.iter().map(|r| r.text.as_str()).collect();
            if !joined.is_empty() {
                return joined;
            }
        }
        self.tree
            .children(id)
            .iter()
            .map(|&child| self.block_text(child))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_block(&mut self, id: BlockId, depth: usize) -> String {
        let Some(block) = self.tree.block(id) else {
            return String::new();
        };
        match block.kind.clone() {
            BlockKind::Page | BlockKind::SyncedSource => {
                self.render_body(self.tree.children(id).to_vec(), depth)
            }
            BlockKind::Heading(level) if level <= 6 => {
                format!("{} {}", "#".repeat(level as usize), self.block_text(id))
            }
            // Editor-internal heading levels beyond Markdown's range.
            BlockKind::Heading(_) => self.block_text(id),
            BlockKind::Text | BlockKind::ToggleHeading => self.block_text(id),
            BlockKind::Divider => "---".to_string(),
            BlockKind::Code { language } => {
                format!("```{}\n{}\n```", language, self.code_text(id))
            }
            BlockKind::Quote | BlockKind::Callout => {
                // Children join with single newlines, not blank lines; a
                // quote is one tight block.
                let children = self.tree.children(id).to_vec();
                let flat = self.flatten(&children);
                let body = flat
                    .into_iter()
                    .map(|child| self.render_block(child, depth))
                    .collect::<Vec<_>>()
                    .join("\n");
                body.split('\n')
                    .map(|line| format!("> {}", line))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            BlockKind::Bullet => self.render_list_item(id, depth, "- ".to_string()),
            BlockKind::Ordered { .. } => {
                let marker = format!("{}. ", ordinal_for(self.tree, id));
                self.render_list_item(id, depth, marker)
            }
            // Flat by contract: no indentation, children ignored.
            BlockKind::Todo { done } => {
                let marker = if done { "- [x] " } else { "- [ ] " };
                format!("{}{}", marker, self.block_text(id))
            }
            BlockKind::Table { columns } => self.render_table(id, columns),
            BlockKind::Sheet {
                token,
                record_id,
                cached_rows,
            } => {
                let block_id = block.id.clone();
                table::render_sheet(
                    &block_id,
                    &token,
                    record_id.as_deref(),
                    cached_rows.as_deref(),
                    self.sheets,
                )
            }
            BlockKind::Image(image) => self.render_image(id, image),
            BlockKind::Grid => {
                let columns: Vec<BlockId> = self.tree.children(id).to_vec();
                columns
                    .into_iter()
                    .map(|column| self.render_body(self.tree.children(column).to_vec(), depth))
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n\n")
            }
            BlockKind::Iframe { url } => match url {
                Some(url) if !url.is_empty() => format!("[iframe]({})", url),
                _ => String::new(),
            },
            BlockKind::Diagram { source } => match source {
                Some(source) if !source.is_empty() => {
                    format!("```mermaid\n{}\n```", source)
                }
                _ => String::new(),
            },
            BlockKind::Unknown(_) => self.block_text(id),
        }
    }

    /// Flatten a child list and render it like a page body.
    fn render_body(&mut self, children: Vec<BlockId>, depth: usize) -> String {
        let flat = self.flatten(&children);
        flat.into_iter()
            .map(|child| self.render_block(child, depth))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn render_list_item(&mut self, id: BlockId, depth: usize, marker: String) -> String {
        let indent = "  ".repeat(depth);
        let mut out = format!("{}{}{}", indent, marker, self.block_text(id));
        let children = self.tree.children(id).to_vec();
        let flat = self.flatten(&children);
        let nested: Vec<String> = flat
            .into_iter()
            .map(|child| self.render_block(child, depth + 1))
            .filter(|s| !s.is_empty())
            .collect();
        if !nested.is_empty() {
            out.push('\n');
            out.push_str(&nested.join("\n"));
        }
        out
    }

    /// Fixed-grid table: children are the cells in row-major order.
    fn render_table(&mut self, id: BlockId, columns: usize) -> String {
        if columns == 0 {
            return String::new();
        }
        let cells: Vec<String> = self
            .tree
            .children(id)
            .to_vec()
            .into_iter()
            .map(|cell| self.render_cell(cell))
            .collect();
        let rows: Vec<Vec<String>> = cells
            .chunks(columns)
            .map(|chunk| chunk.to_vec())
            .collect();
        table::emit_rows(&rows)
    }

    /// Cell content: the cell's child subtree with internal paragraphs
    /// joined by a single space, escaped for table context.
    fn render_cell(&mut self, cell: BlockId) -> String {
        let children = self.tree.children(cell).to_vec();
        let flat = self.flatten(&children);
        let joined = flat
            .into_iter()
            .map(|child| self.render_block(child, 0))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        escape_cell(&joined)
    }

    fn render_image(
        &mut self,
        id: BlockId,
        image: Option<crate::tree::ImageRef>,
    ) -> String {
        let Some(image) = image else {
            return String::new();
        };
        if !image.fetchable {
            return format!("![{}]()", image.name);
        }
        let block_id = self
            .tree
            .block(id)
            .map(|b| b.id.clone())
            .unwrap_or_default();
        let out = format!("![{}]({}{})", image.name, IMAGE_TOKEN_PREFIX, image.token);
        self.images.push(ImagePlaceholder {
            token: image.token,
            name: image.name,
            block_id,
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Block, ImageRef};
    use proptest::prelude::*;

    fn tree_with_children(blocks: Vec<Block>) -> (DocumentTree, Vec<BlockId>) {
        let mut tree = DocumentTree::new();
        let mut ids = Vec::new();
        for block in blocks {
            let id = tree.alloc(block);
            tree.append_child(tree.root(), id);
            ids.push(id);
        }
        (tree, ids)
    }

    #[test]
    fn test_heading_and_paragraph() {
        let (tree, _) = tree_with_children(vec![
            Block::new(BlockKind::Heading(2)).with_text("Section\n"),
            Block::text("Body text"),
        ]);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "## Section\n\nBody text");
        assert_eq!(out.block_count, 2);
    }

    #[test]
    fn test_deep_heading_renders_as_paragraph() {
        let (tree, _) =
            tree_with_children(vec![Block::new(BlockKind::Heading(7)).with_text("deep")]);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "deep");
    }

    #[test]
    fn test_heading_children_spliced_after_it() {
        let mut tree = DocumentTree::new();
        let heading = tree.alloc(Block::new(BlockKind::Heading(1)).with_text("Title"));
        tree.append_child(tree.root(), heading);
        let child = tree.alloc(Block::text("Nested body"));
        tree.append_child(heading, child);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "# Title\n\nNested body");
    }

    #[test]
    fn test_synced_source_inlined() {
        let mut tree = DocumentTree::new();
        let synced = tree.alloc(Block::new(BlockKind::SyncedSource));
        tree.append_child(tree.root(), synced);
        let inner = tree.alloc(Block::text("From elsewhere"));
        tree.append_child(synced, inner);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "From elsewhere");
    }

    #[test]
    fn test_flatten_idempotent() {
        let mut tree = DocumentTree::new();
        let heading = tree.alloc(Block::new(BlockKind::Heading(1)).with_text("h"));
        tree.append_child(tree.root(), heading);
        let a = tree.alloc(Block::text("a"));
        tree.append_child(heading, a);
        let synced = tree.alloc(Block::new(BlockKind::SyncedSource));
        tree.append_child(tree.root(), synced);
        let b = tree.alloc(Block::new(BlockKind::Divider));
        tree.append_child(synced, b);

        let ctx = RenderContext::new(&tree);
        let once = ctx.flatten(tree.children(tree.root()));
        let twice = ctx.flatten(&once);
        assert_eq!(once, twice);
        assert_eq!(once, vec![heading, a, b]);
    }

    #[test]
    fn test_quote_prefixes_every_line() {
        let mut tree = DocumentTree::new();
        let quote = tree.alloc(Block::new(BlockKind::Quote));
        tree.append_child(tree.root(), quote);
        let a = tree.alloc(Block::text("first"));
        tree.append_child(quote, a);
        let b = tree.alloc(Block::text("second"));
        tree.append_child(quote, b);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "> first\n> second");
    }

    #[test]
    fn test_quote_children_join_tight() {
        let mut tree = DocumentTree::new();
        let quote = tree.alloc(Block::new(BlockKind::Quote));
        tree.append_child(tree.root(), quote);
        for text in ["one", "two", "three"] {
            let p = tree.alloc(Block::text(text));
            tree.append_child(quote, p);
        }
        let out = RenderContext::new(&tree).render();
        // No quoted blank line between adjacent paragraphs.
        assert_eq!(out.markdown, "> one\n> two\n> three");
        assert!(!out.markdown.contains("> \n"));
    }

    #[test]
    fn test_code_fallback_chain() {
        let (tree, _) = tree_with_children(vec![
            Block::new(BlockKind::Code {
                language: "rust".to_string(),
            })
            .with_text("fn main() {}\n"),
        ]);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "```rust\nfn main() {}\n```");

        // No full text: reconstruct from children.
        let mut tree = DocumentTree::new();
        let code = tree.alloc(Block::new(BlockKind::Code {
            language: String::new(),
        }));
        tree.append_child(tree.root(), code);
        let l1 = tree.alloc(Block::text("line one"));
        tree.append_child(code, l1);
        let l2 = tree.alloc(Block::text("line two"));
        tree.append_child(code, l2);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "```\nline one\nline two\n```");
    }

    #[test]
    fn test_ordered_reset_after_bullet() {
        let (tree, _) = tree_with_children(vec![
            Block::new(BlockKind::Ordered { seq: None }).with_text("one"),
            Block::new(BlockKind::Bullet).with_text("interruption"),
            Block::new(BlockKind::Ordered { seq: None }).with_text("three"),
        ]);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "1. one\n\n- interruption\n\n1. three");
    }

    #[test]
    fn test_nested_list_indentation() {
        let mut tree = DocumentTree::new();
        let item = tree.alloc(Block::new(BlockKind::Bullet).with_text("outer"));
        tree.append_child(tree.root(), item);
        let nested = tree.alloc(Block::new(BlockKind::Bullet).with_text("inner"));
        tree.append_child(item, nested);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "- outer\n  - inner");
    }

    #[test]
    fn test_todo_markers() {
        let (tree, _) = tree_with_children(vec![
            Block::new(BlockKind::Todo { done: true }).with_text("shipped"),
            Block::new(BlockKind::Todo { done: false }).with_text("pending"),
        ]);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "- [x] shipped\n\n- [ ] pending");
    }

    #[test]
    fn test_todo_renders_flat_ignoring_children() {
        let mut tree = DocumentTree::new();
        let bullet = tree.alloc(Block::new(BlockKind::Bullet).with_text("outer"));
        tree.append_child(tree.root(), bullet);
        let todo = tree.alloc(Block::new(BlockKind::Todo { done: false }).with_text("task"));
        tree.append_child(bullet, todo);
        let note = tree.alloc(Block::text("attached note"));
        tree.append_child(todo, note);
        let out = RenderContext::new(&tree).render();
        // No indentation even when nested, and the child is not rendered.
        assert_eq!(out.markdown, "- outer\n- [ ] task");
    }

    #[test]
    fn test_fixed_grid_table() {
        let mut tree = DocumentTree::new();
        let table = tree.alloc(Block::new(BlockKind::Table { columns: 2 }));
        tree.append_child(tree.root(), table);
        for text in ["A", "B", "C", "D"] {
            let cell = tree.alloc(Block::new(BlockKind::Unknown("table_cell".to_string())));
            tree.append_child(table, cell);
            let para = tree.alloc(Block::text(text));
            tree.append_child(cell, para);
        }
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "| A | B |\n| --- | --- |\n| C | D |");
    }

    #[test]
    fn test_image_placeholder_recorded() {
        let (tree, _) = tree_with_children(vec![Block::new(BlockKind::Image(Some(ImageRef {
            token: "tok123".to_string(),
            name: "diagram.png".to_string(),
            fetchable: true,
        })))]);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "![diagram.png](__IMAGE_TOKEN__tok123)");
        assert_eq!(out.images.len(), 1);
        assert_eq!(out.images[0].token, "tok123");
    }

    #[test]
    fn test_unfetchable_image_empty_target() {
        let (tree, _) = tree_with_children(vec![Block::new(BlockKind::Image(Some(ImageRef {
            token: "tok123".to_string(),
            name: "photo".to_string(),
            fetchable: false,
        })))]);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "![photo]()");
        assert!(out.images.is_empty());
    }

    #[test]
    fn test_iframe_and_diagram() {
        let (tree, _) = tree_with_children(vec![
            Block::new(BlockKind::Iframe {
                url: Some("https://example.com/embed".to_string()),
            }),
            Block::new(BlockKind::Iframe { url: None }),
            Block::new(BlockKind::Diagram {
                source: Some("graph TD; a-->b".to_string()),
            }),
        ]);
        let out = RenderContext::new(&tree).render();
        assert_eq!(
            out.markdown,
            "[iframe](https://example.com/embed)\n\n\n\n```mermaid\ngraph TD; a-->b\n```"
        );
    }

    #[test]
    fn test_grid_columns_rendered_independently() {
        let mut tree = DocumentTree::new();
        let grid = tree.alloc(Block::new(BlockKind::Grid));
        tree.append_child(tree.root(), grid);
        for texts in [vec!["left a", "left b"], vec!["right"]] {
            let column = tree.alloc(Block::new(BlockKind::Unknown("grid_column".to_string())));
            tree.append_child(grid, column);
            for text in texts {
                let para = tree.alloc(Block::text(text));
                tree.append_child(column, para);
            }
        }
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "left a\n\nleft b\n\nright");
    }

    proptest! {
        #[test]
        fn prop_fixed_grid_rows_plus_separator(rows in 0usize..6, cols in 1usize..5) {
            let mut tree = DocumentTree::new();
            let table = tree.alloc(Block::new(BlockKind::Table { columns: cols }));
            tree.append_child(tree.root(), table);
            for i in 0..rows * cols {
                let cell =
                    tree.alloc(Block::new(BlockKind::Unknown("table_cell".to_string())));
                tree.append_child(table, cell);
                let para = tree.alloc(Block::text(format!("c{}", i)));
                tree.append_child(cell, para);
            }
            let out = RenderContext::new(&tree).render();
            let lines = if out.markdown.is_empty() {
                0
            } else {
                out.markdown.lines().count()
            };
            let expected = if rows == 0 { 0 } else { rows + 1 };
            prop_assert_eq!(lines, expected);
        }
    }

    #[test]
    fn test_unknown_kind_falls_back_to_text() {
        let (tree, _) = tree_with_children(vec![
            Block::new(BlockKind::Unknown("bitable".to_string())).with_text("raw text"),
            Block::new(BlockKind::Unknown("whiteboard".to_string())),
        ]);
        let out = RenderContext::new(&tree).render();
        assert_eq!(out.markdown, "raw text\n\n");
    }
}
