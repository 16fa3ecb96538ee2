//! Image placeholder resolution.
//!
//! Rendering emits `![name](__IMAGE_TOKEN__token)` placeholders and a side
//! list of tokens; this module is the second phase that turns them into
//! relative paths. Resolution is sequential over tokens, skips any token
//! whose resolve or fetch fails, and performs no I/O itself beyond the two
//! collaborator callbacks.

use memchr::memmem;
use tracing::debug;

/// Textual prefix that marks an unresolved image target.
pub const IMAGE_TOKEN_PREFIX: &str = "__IMAGE_TOKEN__";

/// An image reference recorded during rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlaceholder {
    /// Opaque token identifying the image with the source editor.
    pub token: String,
    /// Display name from the image block.
    pub name: String,
    /// Editor ID of the block that emitted the placeholder.
    pub block_id: String,
}

/// Collaborator that turns tokens into bytes.
///
/// Both steps are independently fallible; `None` from either means "skip
/// this token" and never aborts the others. Timeouts are the
/// implementation's concern and should surface as `None`.
pub trait ImageFetcher {
    /// Obtain a transient source locator (typically a URL) for a token.
    fn resolve_locator(&mut self, token: &str) -> Option<String>;

    /// Retrieve the bytes behind a locator.
    fn fetch_bytes(&mut self, locator: &str) -> Option<Vec<u8>>;
}

/// One successfully fetched image, for the caller to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// Relative file name, `img_N.EXT`.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of the resolution pass.
#[derive(Debug, Default)]
pub struct ImageResolution {
    /// Text with every successfully resolved placeholder substituted.
    pub markdown: String,
    /// Fetched images in resolution order.
    pub images: Vec<ResolvedImage>,
    /// Number of successfully resolved tokens.
    pub resolved: usize,
}

/// Resolve every image placeholder found in `markdown`.
///
/// Tokens are located by scanning for [`IMAGE_TOKEN_PREFIX`] and taken in
/// first-appearance order, deduplicated. Each successful resolve+fetch
/// replaces the placeholder substring with `folder/img_N.EXT`; failures
/// leave the placeholder untouched.
pub fn resolve_images(
    markdown: &str,
    folder: &str,
    fetcher: &mut dyn ImageFetcher,
) -> ImageResolution {
    let mut text = markdown.to_string();
    let mut images = Vec::new();
    let mut resolved = 0usize;

    for token in scan_tokens(markdown) {
        let Some(locator) = fetcher.resolve_locator(&token) else {
            debug!(token = %token, "image token not resolvable, skipping");
            continue;
        };
        let Some(bytes) = fetcher.fetch_bytes(&locator) else {
            debug!(token = %token, "image fetch failed, skipping");
            continue;
        };
        let file_name = format!("img_{}{}", resolved, pick_extension(&locator));
        let placeholder = format!("{}{}", IMAGE_TOKEN_PREFIX, token);
        text = text.replace(&placeholder, &format!("{}/{}", folder, file_name));
        images.push(ResolvedImage { file_name, bytes });
        resolved += 1;
    }

    ImageResolution {
        markdown: text,
        images,
        resolved,
    }
}

/// Distinct placeholder tokens in first-appearance order.
fn scan_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for start in memmem::find_iter(text.as_bytes(), IMAGE_TOKEN_PREFIX) {
        let rest = &text[start + IMAGE_TOKEN_PREFIX.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(rest.len());
        let token = &rest[..end];
        if !token.is_empty() && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// File extension from the locator string, defaulting to `.png`.
fn pick_extension(locator: &str) -> &'static str {
    let lower = locator.to_ascii_lowercase();
    if lower.contains(".jpg") || lower.contains(".jpeg") {
        ".jpg"
    } else if lower.contains(".gif") {
        ".gif"
    } else if lower.contains(".webp") {
        ".webp"
    } else {
        ".png"
    }
}
