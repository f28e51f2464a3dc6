//! Lexical cleanup
//!
//! Removes C and C++ comments, then drops blank lines and trims the rest.

use regex::Regex;
use std::sync::LazyLock;

static RE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").unwrap());

/// Replace every comment with a single space
pub fn strip_comments(text: &str) -> String {
    RE_COMMENT.replace_all(text, " ").into_owned()
}

/// Comment-free, trimmed, non-empty lines of `text`
pub fn clean_lines(text: &str) -> Vec<String> {
    strip_comments(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
