//! Markdown generation from a document tree.

pub mod escape;
pub mod numbering;
mod render;
mod table;

pub use render::{RenderContext, RenderOutput};
