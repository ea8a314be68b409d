//! Description file parsing.
//!
//! Description files come in two dialects:
//! - **Key/value**: `标题: 示例` / `author: Jane`, one field per line, with
//!   either an ASCII or a full-width colon as separator.
//! - **Free text**: a plain paragraph. The title comes from the folder name
//!   and genres/tags are inferred from keyword rules.

use crate::error::MetadataError;
use crate::novel::NovelStatus;

/// Author used when none is given.
pub const DEFAULT_AUTHOR: &str = "Unknown Author";

/// Rating used when none is given or it fails to parse.
pub const DEFAULT_RATING: f64 = 4.5;

/// Ratings are clamped to this inclusive range.
pub const RATING_RANGE: (f64, f64) = (0.0, 5.0);

const DEFAULT_TAGS: &[&str] = &["romance", "fantasy"];
const DEFAULT_GENRES: &[&str] = &["Romance", "Fantasy"];

/// Number of non-empty lines inspected to pick a dialect.
const DIALECT_SAMPLE_LINES: usize = 5;

const MAX_INFERRED_TAGS: usize = 5;
const MAX_INFERRED_GENRES: usize = 3;

const SEPARATORS: [char; 2] = [':', '：'];
const LIST_DELIMITERS: [char; 2] = [',', '，'];

/// Canonical metadata fields a key can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Author,
    Description,
    Tags,
    Genres,
    Status,
    Rating,
}

/// Recognized keys (compared after lower-casing).
const FIELD_KEYS: &[(&str, Field)] = &[
    ("书籍名称", Field::Title),
    ("标题", Field::Title),
    ("书名", Field::Title),
    ("title", Field::Title),
    ("作者", Field::Author),
    ("author", Field::Author),
    ("简介", Field::Description),
    ("描述", Field::Description),
    ("description", Field::Description),
    ("标签", Field::Tags),
    ("tags", Field::Tags),
    ("类型", Field::Genres),
    ("genre", Field::Genres),
    ("genres", Field::Genres),
    ("状态", Field::Status),
    ("status", Field::Status),
    ("评分", Field::Rating),
    ("rating", Field::Rating),
];

/// Status words (compared after lower-casing). Anything else is `completed`.
const STATUS_VOCABULARY: &[(&str, NovelStatus)] = &[
    ("连载中", NovelStatus::Ongoing),
    ("连载", NovelStatus::Ongoing),
    ("更新中", NovelStatus::Ongoing),
    ("ongoing", NovelStatus::Ongoing),
    ("已完结", NovelStatus::Completed),
    ("完结", NovelStatus::Completed),
    ("完成", NovelStatus::Completed),
    ("completed", NovelStatus::Completed),
    ("暂停", NovelStatus::Paused),
    ("paused", NovelStatus::Paused),
];

/// A keyword inference rule: if any keyword occurs in the lowercased text,
/// the rule's tags and genre are added.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub tags: &'static [&'static str],
    pub genre: &'static str,
}

/// Rules applied to free-text descriptions, in order.
pub const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["werewolf", "wolf", "alpha", "pack", "mate", "luna"],
        tags: &["werewolf", "alpha", "pack"],
        genre: "Werewolf",
    },
    KeywordRule {
        keywords: &["dragon", "drake", "wyvern"],
        tags: &["dragon", "fantasy"],
        genre: "Fantasy",
    },
    KeywordRule {
        keywords: &["ocean", "sea", "marine", "underwater", "abyss"],
        tags: &["ocean", "underwater", "marine"],
        genre: "Fantasy",
    },
    KeywordRule {
        keywords: &["romance", "love", "forbidden", "relationship"],
        tags: &["romance"],
        genre: "Romance",
    },
    KeywordRule {
        keywords: &["ceo", "billionaire", "tycoon", "executive"],
        tags: &["ceo", "billionaire", "contemporary"],
        genre: "Contemporary",
    },
];

/// Which dialect a description file is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    KeyValue,
    FreeText,
}

/// Structured metadata parsed from a description file.
#[derive(Debug, Clone, PartialEq)]
pub struct NovelMetadata {
    pub title: String,
    pub author: String,
    pub description: String,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub status: NovelStatus,
    pub rating: f64,
}

/// Picks the dialect by looking for a separator in the first non-empty lines.
pub fn detect_dialect(text: &str) -> Dialect {
    let has_pairs = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(DIALECT_SAMPLE_LINES)
        .any(|line| line.contains(SEPARATORS));

    if has_pairs {
        Dialect::KeyValue
    } else {
        Dialect::FreeText
    }
}

/// Parses a description file.
///
/// `folder_name` is used as the title when the file does not provide one.
pub fn parse_metadata(text: &str, folder_name: &str) -> Result<NovelMetadata, MetadataError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(MetadataError::Empty);
    }

    let metadata = match detect_dialect(text) {
        Dialect::KeyValue => parse_key_value(text, folder_name),
        Dialect::FreeText => parse_free_text(text, folder_name),
    };

    Ok(metadata)
}

fn parse_key_value(text: &str, folder_name: &str) -> NovelMetadata {
    let mut title = None;
    let mut author = None;
    let mut tags = Vec::new();
    let mut genres = Vec::new();
    let mut status = NovelStatus::default();
    let mut rating = DEFAULT_RATING;
    let mut description_lines: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((key, value)) = line.split_once(SEPARATORS) else {
            description_lines.push(line);
            continue;
        };

        let key = key.trim().to_lowercase();
        let value = value.trim();
        let Some(field) = lookup_field(&key) else {
            continue;
        };

        match field {
            Field::Title => title = non_empty(value),
            Field::Author => author = non_empty(value),
            Field::Description => {
                if !value.is_empty() {
                    description_lines.push(value);
                }
            }
            Field::Tags => tags = split_list(value),
            Field::Genres => genres = split_list(value),
            Field::Status => status = parse_status(value),
            Field::Rating => rating = parse_rating(value),
        }
    }

    NovelMetadata {
        title: title.unwrap_or_else(|| folder_name.to_string()),
        author: author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        description: description_lines.join("\n"),
        genres: or_default(genres, DEFAULT_GENRES),
        tags: or_default(tags, DEFAULT_TAGS),
        status,
        rating,
    }
}

fn parse_free_text(text: &str, folder_name: &str) -> NovelMetadata {
    let (tags, genres) = infer_tags_and_genres(text, KEYWORD_RULES);

    NovelMetadata {
        title: folder_name.to_string(),
        author: DEFAULT_AUTHOR.to_string(),
        description: text.to_string(),
        genres,
        tags,
        status: NovelStatus::default(),
        rating: DEFAULT_RATING,
    }
}

/// Applies keyword rules to a text, returning deduplicated `(tags, genres)`.
///
/// Falls back to the default tags/genres when no rule matches.
pub fn infer_tags_and_genres(text: &str, rules: &[KeywordRule]) -> (Vec<String>, Vec<String>) {
    let lowered = text.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    let mut genres: Vec<String> = Vec::new();

    for rule in rules {
        if !rule.keywords.iter().any(|kw| lowered.contains(kw)) {
            continue;
        }
        for tag in rule.tags {
            push_unique(&mut tags, tag);
        }
        push_unique(&mut genres, rule.genre);
    }

    tags.truncate(MAX_INFERRED_TAGS);
    genres.truncate(MAX_INFERRED_GENRES);

    (or_default(tags, DEFAULT_TAGS), or_default(genres, DEFAULT_GENRES))
}

/// Maps a status word through the fixed vocabulary.
pub fn parse_status(value: &str) -> NovelStatus {
    let lowered = value.trim().to_lowercase();
    STATUS_VOCABULARY
        .iter()
        .find(|(word, _)| *word == lowered)
        .map(|(_, status)| *status)
        .unwrap_or_default()
}

/// Parses a rating, clamping it into range. Unparseable values get the default.
pub fn parse_rating(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(rating) if rating.is_finite() => rating.clamp(RATING_RANGE.0, RATING_RANGE.1),
        _ => DEFAULT_RATING,
    }
}

fn lookup_field(key: &str) -> Option<Field> {
    FIELD_KEYS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, field)| *field)
}

fn split_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    for item in value.split(LIST_DELIMITERS).map(str::trim) {
        if !item.is_empty() {
            push_unique(&mut items, item);
        }
    }
    items
}

fn push_unique(items: &mut Vec<String>, item: &str) {
    if !items.iter().any(|existing| existing == item) {
        items.push(item.to_string());
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn or_default(items: Vec<String>, default: &[&str]) -> Vec<String> {
    if items.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        items
    }
}
