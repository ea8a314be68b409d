//! Utility functions for common text operations.

use regex::Regex;
use std::sync::LazyLock;

/// Characters that are neither word characters, whitespace, nor hyphens.
static NON_SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("Invalid NON_SLUG_REGEX"));

/// Runs of hyphens and whitespace, collapsed to a single separator.
static SEPARATOR_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("Invalid SEPARATOR_RUN_REGEX"));

/// Slug used when a title contains nothing slug-worthy.
pub const FALLBACK_SLUG: &str = "untitled";

/// Default maximum length of a short description, in characters.
pub const SHORT_DESCRIPTION_CHARS: usize = 200;

/// Generates a URL-safe slug from a title.
///
/// The title is lower-cased, non-word characters are removed, and runs of
/// whitespace or hyphens collapse to a single `-`. Unicode word characters
/// (including CJK) are kept, so `"示例"` slugs to itself.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_REGEX.replace_all(&lowered, "");
    let joined = SEPARATOR_RUN_REGEX.replace_all(&stripped, "-");
    let slug = joined.trim_matches('-');

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

const SENTENCE_END: char = '。';

/// Shortens a description to at most `max_chars` characters.
///
/// Long descriptions end on the last `。` inside the limit when there is one.
/// Otherwise they are cut at the last space (or at the limit, for text
/// without spaces) and get a trailing `...`.
pub fn short_description(description: &str, max_chars: usize) -> String {
    if description.chars().count() <= max_chars {
        return description.to_string();
    }

    let head = truncate_chars(description, max_chars);
    if let Some(idx) = head.rfind(SENTENCE_END) {
        return head[..idx + SENTENCE_END.len_utf8()].to_string();
    }

    let cut = match head.rfind(' ') {
        Some(idx) => &head[..idx],
        None => head,
    };

    format!("{}...", cut)
}

/// Returns the longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Counts whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
