//! # larkdown
//!
//! A library for converting collaborative-editor block trees to Markdown.
//!
//! ## Features
//!
//! - Deserialize kind-tagged block-tree snapshots into a typed [`DocumentTree`]
//! - Render headings, lists, tables, quotes, code, images and more via [`Converter`]
//! - Styled inline runs compose to nested Markdown/HTML markup
//! - Spreadsheet blocks render from caller-resolved data (`sheet` module)
//! - Two-phase image handling: placeholders at render time, byte resolution after
//!
//! ## Quick Start
//!
//! ```
//! use larkdown::{Converter, DocumentTree};
//!
//! let snapshot = r#"{
//!     "id": "root", "type": "page",
//!     "zoneState": { "allText": "My Doc\n" },
//!     "children": [
//!         { "id": "b1", "type": "heading1", "zoneState": { "allText": "Intro\n" } },
//!         { "id": "b2", "type": "text", "zoneState": { "allText": "Hello\n" } }
//!     ]
//! }"#;
//!
//! let tree = DocumentTree::from_snapshot_str(snapshot).unwrap();
//! let conversion = Converter::new().convert(Some(&tree)).unwrap();
//! assert_eq!(conversion.markdown, "# Intro\n\nHello\n");
//! assert_eq!(conversion.title.as_deref(), Some("My Doc"));
//! ```
//!
//! ## Resolving Images
//!
//! Rendering leaves `__IMAGE_TOKEN__` placeholders in the text; resolve them
//! afterwards with an [`ImageFetcher`]:
//!
//! ```
//! use larkdown::images::{ImageFetcher, resolve_images};
//!
//! struct NoImages;
//! impl ImageFetcher for NoImages {
//!     fn resolve_locator(&mut self, _token: &str) -> Option<String> { None }
//!     fn fetch_bytes(&mut self, _locator: &str) -> Option<Vec<u8>> { None }
//! }
//!
//! let text = "![chart](__IMAGE_TOKEN__abc123)";
//! let out = resolve_images(text, "images", &mut NoImages);
//! assert_eq!(out.markdown, text); // unresolved placeholders stay put
//! assert_eq!(out.resolved, 0);
//! ```

pub mod convert;
pub mod error;
pub mod images;
pub mod inline;
pub mod markdown;
pub mod sheet;
pub mod tree;

pub use convert::{Conversion, Converter, MarkupStats};
pub use error::{Error, Result};
pub use images::{ImageFetcher, ImagePlaceholder, ImageResolution, ResolvedImage, resolve_images};
pub use sheet::{CellStyle, SheetProvider, SheetSegment, SheetSource};
pub use tree::{Block, BlockId, BlockKind, DocumentTree, ImageRef};
