//! Content file splitting.
//!
//! A content file is a sequence of blocks separated by `###`. Each block
//! with a non-empty body becomes one chapter; numbering counts only the
//! retained chapters, so it is always `1..=N` without gaps.

use crate::novel::Chapter;
use crate::utils::word_count;
use regex::Regex;
use std::sync::LazyLock;

/// The only chapter delimiter in content files.
pub const CHAPTER_DELIMITER: &str = "###";

/// Title used when a heading has nothing left after cleaning.
pub const UNTITLED_CHAPTER: &str = "Untitled Chapter";

/// English heading: `chapter 12`, `Chapter 3: The Return`.
static ENGLISH_HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^chapter\s+(\d+)").expect("Invalid ENGLISH_HEADING_REGEX")
});

/// Localized heading: `第12章`, `第十二章 重逢`, `章节3`.
static LOCALIZED_HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:第\s*[0-9零〇一二三四五六七八九十百千两]+\s*[章节回卷]|章节\s*\d+)")
        .expect("Invalid LOCALIZED_HEADING_REGEX")
});

/// Separator punctuation left in front of a title after the heading.
/// Digits stay: they belong to titles like `1984年的夏天`.
static TITLE_DECORATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s:：\-—、，,·]+").expect("Invalid TITLE_DECORATION_REGEX")
});

/// Glyphs that form decorative rules when a line repeats only one of them.
const DECORATIVE_GLYPHS: &[char] = &[
    '*', '-', '=', '_', '~', '+', '#', '·', '•', '—', '─', '━', '＊', '－', '＝', '～', '※', '☆',
    '★', '◆', '◇',
];

/// Splits a content file into chapters.
///
/// Every chapter gets `publish_date`. An empty result means the file held no
/// usable content.
pub fn split_chapters(text: &str, publish_date: &str) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = Vec::new();

    for block in text.split(CHAPTER_DELIMITER).map(str::trim) {
        if block.is_empty() {
            continue;
        }

        let number = chapters.len() as u32 + 1;
        let (title, body_lines) = extract_title(block, number);

        let content = body_lines
            .filter(|line| !is_blank_or_decorative(line))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if content.is_empty() {
            continue;
        }

        chapters.push(Chapter {
            number,
            title,
            word_count: word_count(&content),
            content,
            publish_date: publish_date.to_string(),
        });
    }

    chapters
}

/// Determines a block's title and the lines that make up its body.
fn extract_title(block: &str, number: u32) -> (String, std::iter::Skip<std::str::Lines<'_>>) {
    let first_line = block.lines().next().unwrap_or_default().trim();

    if let Some(caps) = ENGLISH_HEADING_REGEX.captures(first_line) {
        return (format!("Chapter {}", &caps[1]), block.lines().skip(1));
    }

    if let Some(heading) = LOCALIZED_HEADING_REGEX.find(first_line) {
        let title = clean_title(&first_line[heading.end()..]);
        return (title, block.lines().skip(1));
    }

    (format!("Chapter {}", number), block.lines().skip(0))
}

/// Strips leading separator punctuation from a heading remainder.
pub fn clean_title(raw: &str) -> String {
    let cleaned = TITLE_DECORATION_REGEX.replace(raw.trim(), "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        UNTITLED_CHAPTER.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Returns true for empty lines and lines repeating a single decorative glyph.
pub fn is_blank_or_decorative(line: &str) -> bool {
    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return true;
    };

    DECORATIVE_GLYPHS.contains(&first) && chars.all(|c| c == first)
}
