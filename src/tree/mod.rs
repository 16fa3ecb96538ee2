//! Arena-backed document tree.
//!
//! A [`DocumentTree`] is a read-only snapshot of one document, built fresh
//! per conversion call and discarded afterwards. Blocks live in a flat
//! arena indexed by [`BlockId`]; parent links are materialized at build
//! time so ordered-list numbering can be computed from sibling position
//! without back-references inside the nodes themselves.

mod block;
mod snapshot;

pub use block::{Block, BlockId, BlockKind, ImageRef};

/// Read-only snapshot of a document's block tree.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    blocks: Vec<Block>,
    children: Vec<Vec<BlockId>>,
    parents: Vec<Option<BlockId>>,
}

impl DocumentTree {
    /// Create a tree containing only a root page block.
    pub fn new() -> Self {
        Self::with_root(Block::new(BlockKind::Page))
    }

    /// Create a tree with the given root block.
    pub fn with_root(root: Block) -> Self {
        Self {
            blocks: vec![root],
            children: vec![Vec::new()],
            parents: vec![None],
        }
    }

    /// Allocate a block, returning its ID.
    pub fn alloc(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(block);
        self.children.push(Vec::new());
        self.parents.push(None);
        id
    }

    /// Append `child` to `parent`'s child list and record the back-link.
    pub fn append_child(&mut self, parent: BlockId, child: BlockId) {
        if parent.index() >= self.blocks.len() || child.index() >= self.blocks.len() {
            return;
        }
        self.children[parent.index()].push(child);
        self.parents[child.index()] = Some(parent);
    }

    /// The root block ID.
    pub fn root(&self) -> BlockId {
        BlockId::ROOT
    }

    /// Get a block by ID.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    /// Ordered children of a block.
    pub fn children(&self, id: BlockId) -> &[BlockId] {
        self.children.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent of a block (`None` for the root or an unknown ID).
    pub fn parent(&self, id: BlockId) -> Option<BlockId> {
        self.parents.get(id.index()).copied().flatten()
    }

    /// Total number of blocks in the tree.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the tree holds no blocks. Never true for a constructed
    /// tree, which always has a root.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The document's own display title: the root block's text with a
    /// trailing newline stripped, when present and non-empty.
    pub fn title(&self) -> Option<String> {
        let root = self.block(BlockId::ROOT)?;
        let text = root.all_text.as_deref()?;
        let text = text.strip_suffix('\n').unwrap_or(text);
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}
