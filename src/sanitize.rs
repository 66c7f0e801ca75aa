use std::sync::LazyLock;

use regex::Regex;

static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([\S\s]+?)`").expect("code span pattern is valid"));

/// Escape the five HTML-special characters.
pub fn escape_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render raw comment content as HTML: escape it, then turn backtick spans
/// into `<code>` elements.
///
/// Not idempotent. Apply exactly once to raw content.
pub fn sanitize(content: &str) -> String {
    let escaped = escape_html(content);
    CODE_SPAN
        .replace_all(&escaped, "<code>$1</code>")
        .into_owned()
}
