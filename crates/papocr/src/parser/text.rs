use std::sync::LazyLock;

use regex::Regex;

static RE_HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\r\n]+").unwrap());
static RE_LEADING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\n\r]+)[^\S\n\r]+").unwrap());
static RE_TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n\r]+$").unwrap());

/// Normalizes whitespace in OCR output.
///
/// Runs of horizontal whitespace collapse to one space, lines lose their
/// leading whitespace, the whole text is trimmed and NUL bytes become
/// spaces.
pub fn post_process_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let collapsed = RE_HORIZONTAL_SPACE.replace_all(text, " ");
    let no_leading = RE_LEADING_SPACE.replace_all(&collapsed, "${1}");
    let no_trailing = RE_TRAILING_SPACE.replace_all(&no_leading, "");

    no_trailing.trim().replace('\0', " ")
}
