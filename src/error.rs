//! Error types for document conversion.

use thiserror::Error;

/// Errors that can occur while obtaining or decoding a document tree.
///
/// Per-block problems never surface here: malformed block data degrades to
/// empty or partial output and the conversion continues.
#[derive(Error, Debug)]
pub enum Error {
    /// The root tree object could not be obtained from the collaborator.
    #[error("document source not available")]
    SourceUnavailable,

    /// The snapshot could not be decoded as a block tree at all.
    #[error("snapshot decoding error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;
