//! Inline runs and the style composer.
//!
//! A paragraph-like block's content is an ordered sequence of styled runs.
//! [`compose`] turns one run into Markdown/HTML-hybrid inline markup with
//! a fixed nesting order, innermost to outermost: color span, then
//! strikethrough, bold, italic, and finally the link wrapper. Code spans
//! and inline math short-circuit the pipeline entirely.

use percent_encoding::percent_decode_str;

use crate::markdown::escape::escape_html;

/// One styled span of inline text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineRun {
    pub text: String,
    pub style: RunStyle,
}

impl InlineRun {
    /// Create an unstyled run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::default(),
        }
    }

    /// Create a styled run.
    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Independent style attributes of a run. Every attribute that is set
/// applies; combinations nest in the order fixed by [`compose`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    /// Renders the raw text as a code span, bypassing all other styling.
    pub inline_code: bool,
    /// Inline math source; renders as `$...$`, bypassing other styling.
    pub equation: Option<String>,
    /// Foreground color token. The literal `"inherit"` counts as unset.
    pub fore_color: Option<String>,
    /// Background highlight color token. Wins over the foreground.
    pub back_color: Option<String>,
    /// Link target URI.
    pub link: Option<String>,
    /// Structured mention; substitutes display text and the link target.
    pub mention: Option<Mention>,
    /// Structural padding marker; the run carries no content.
    pub pad_marker: bool,
}

/// An embedded document reference resolved to display text and a URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub title: String,
    pub url: String,
}

/// Compose one run into inline markup.
///
/// Returns `None` for runs that are structure rather than content:
/// padding markers and bare unstyled newlines.
pub fn compose(run: &InlineRun) -> Option<String> {
    let style = &run.style;
    if style.pad_marker {
        return None;
    }
    if *style == RunStyle::default() && run.text == "\n" {
        return None;
    }

    if let Some(equation) = style.equation.as_deref()
        && !equation.is_empty()
    {
        let equation = equation.strip_suffix('\n').unwrap_or(equation);
        return Some(format!("${}$", equation));
    }
    if style.inline_code {
        return Some(format!("`{}`", run.text));
    }

    let mut text = run.text.clone();
    let mut link = style.link.clone();
    if let Some(mention) = &style.mention {
        text.push_str(&mention.title);
        link = Some(mention.url.clone());
    }

    let mut md = text;
    if let Some(bg) = color_token(style.back_color.as_deref()) {
        md = format!(
            "<mark style=\"background:{}\">{}</mark>",
            bg,
            escape_html(&md)
        );
    } else if let Some(fg) = color_token(style.fore_color.as_deref()) {
        md = format!("<font color=\"{}\">{}</font>", fg, escape_html(&md));
    }
    if style.strikethrough {
        md = format!("~~{}~~", md);
    }
    if style.bold {
        md = format!("**{}**", md);
    }
    if style.italic {
        md = format!("*{}*", md);
    }
    if let Some(link) = link {
        md = format!("[{}]({})", md, decode_link(&link));
    }
    Some(md)
}

/// Compose a whole run sequence, dropping structural runs.
pub fn compose_runs(runs: &[InlineRun]) -> String {
    runs.iter().filter_map(compose).collect()
}

fn color_token(token: Option<&str>) -> Option<&str> {
    token.filter(|c| !c.is_empty() && *c != "inherit")
}

/// Percent-decode a link target, falling back to the raw string when the
/// decoded bytes are not valid UTF-8.
fn decode_link(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}
