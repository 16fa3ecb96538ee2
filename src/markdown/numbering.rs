//! Ordered-list numbering from sibling position.

use crate::tree::{BlockId, BlockKind, DocumentTree};

/// Compute the display number for an ordered-item block.
///
/// An explicit numeric sequence recorded by the editor wins. Otherwise the
/// parent's children are scanned in order: consecutive ordered items count
/// up, any other kind resets the counter, and the number is the running
/// count at the target item (minimum 1). An item without a parent numbers
/// as 1.
pub fn ordinal_for(tree: &DocumentTree, id: BlockId) -> u64 {
    if let Some(block) = tree.block(id)
        && let BlockKind::Ordered { seq: Some(seq) } = block.kind
    {
        return seq;
    }

    let Some(parent) = tree.parent(id) else {
        return 1;
    };

    let mut count = 0u64;
    for &sibling in tree.children(parent) {
        match tree.block(sibling).map(|b| &b.kind) {
            Some(BlockKind::Ordered { .. }) => count += 1,
            _ => count = 0,
        }
        if sibling == id {
            break;
        }
    }
    count.max(1)
}
