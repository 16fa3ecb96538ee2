//! Pure escaping utilities for generated markup.

/// Escape text for embedding inside an HTML styling span.
///
/// # Examples
///
/// ```
/// use larkdown::markdown::escape::escape_html;
///
/// assert_eq!(escape_html("a < b & c"), "a &lt; b &amp; c");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a table cell: a literal pipe would break the row, and newlines
/// collapse to spaces.
///
/// # Examples
///
/// ```
/// use larkdown::markdown::escape::escape_cell;
///
/// assert_eq!(escape_cell("a | b"), "a \\| b");
/// assert_eq!(escape_cell("two\nlines"), "two lines");
/// ```
pub fn escape_cell(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '|' => result.push_str("\\|"),
            '\n' => result.push(' '),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_all_specials() {
        assert_eq!(escape_html("<b>&amp;</b>"), "&lt;b&gt;&amp;amp;&lt;/b&gt;");
    }

    #[test]
    fn test_escape_html_passthrough() {
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_escape_cell_pipes_and_newlines() {
        assert_eq!(escape_cell("a|b|c"), "a\\|b\\|c");
        assert_eq!(escape_cell("a\nb\nc"), "a b c");
        assert_eq!(escape_cell("a | b\nc"), "a \\| b c");
    }
}
