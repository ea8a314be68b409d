//! Novel and chapter entities, and building them from source folders.
//!
//! A source folder holds a description file, a content file and optionally
//! a cover image. Both the current (`描述.txt` / `正文.txt`) and the legacy
//! (`书籍描述.txt` / `书籍正文.txt`) file names are accepted; the current
//! name wins when both exist.

use crate::chapters::split_chapters;
use crate::error::BuildError;
use crate::metadata::parse_metadata;
use crate::reader::read_text;
use crate::utils::{SHORT_DESCRIPTION_CHARS, short_description, slugify};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Description file names, preferred first.
pub const DESCRIPTION_FILENAMES: [&str; 2] = ["描述.txt", "书籍描述.txt"];

/// Content file names, preferred first.
pub const CONTENT_FILENAMES: [&str; 2] = ["正文.txt", "书籍正文.txt"];

/// Extensions recognized as cover images (compared lower-cased).
pub const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Publication status of a novel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NovelStatus {
    Ongoing,
    #[default]
    Completed,
    Paused,
}

/// A single chapter of a novel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Chapter {
    /// Chapter number (1-based, contiguous).
    pub number: u32,

    /// Extracted or synthesized title.
    pub title: String,

    /// Chapter body, never empty for freshly parsed chapters.
    pub content: String,

    /// Whitespace-separated word count of `content`.
    pub word_count: usize,

    /// Date the chapter was parsed (`YYYY-MM-DD`).
    pub publish_date: String,
}

/// A novel built from one source folder.
///
/// Unknown or missing fields default when deserializing so that caches
/// written by older versions still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Novel {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub short_description: String,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub status: NovelStatus,
    pub rating: f64,
    pub cover_path: Option<String>,
    pub chapters: Vec<Chapter>,
    pub total_chapters: usize,
    pub word_count: usize,
    pub last_updated: String,
    pub created_at: String,
    pub folder_path: String,
    pub folder_name: String,

    /// MD5 of the raw description bytes followed by the raw content bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl Novel {
    /// Changes the identifier, keeping `id` and `slug` in sync.
    pub fn set_slug(&mut self, slug: String) {
        self.id = slug.clone();
        self.slug = slug;
    }
}

/// The files that make up one source folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
    pub description: PathBuf,
    pub content: PathBuf,
    pub cover: Option<PathBuf>,
}

impl SourceFiles {
    /// Resolves the description, content and cover files of a folder.
    pub fn resolve(folder: &Path) -> Result<Self, BuildError> {
        let description = first_existing(folder, &DESCRIPTION_FILENAMES).ok_or_else(|| {
            BuildError::MissingFile {
                folder: folder_name(folder),
                kind: "description",
            }
        })?;
        let content = first_existing(folder, &CONTENT_FILENAMES).ok_or_else(|| {
            BuildError::MissingFile {
                folder: folder_name(folder),
                kind: "content",
            }
        })?;

        Ok(Self {
            description,
            content,
            cover: find_cover_image(folder),
        })
    }
}

/// Builds a novel from a source folder.
///
/// `today` (`YYYY-MM-DD`) stamps `last_updated`, `created_at` and every
/// chapter's `publish_date`.
pub fn build_novel(folder: &Path, today: &str) -> Result<Novel, BuildError> {
    let files = SourceFiles::resolve(folder)?;
    let name = folder_name(folder);

    let description_file = read_text(&files.description)?;
    let content_file = read_text(&files.content)?;
    tracing::debug!(
        folder = %name,
        description_encoding = description_file.encoding,
        content_encoding = content_file.encoding,
        "Read source files"
    );

    let metadata = parse_metadata(&description_file.text, &name)?;
    let chapters = split_chapters(&content_file.text, today);
    if chapters.is_empty() {
        return Err(BuildError::NoChapters { folder: name });
    }

    let content_hash = fingerprint(&description_file.raw, &content_file.raw);
    let slug = slugify(&metadata.title);
    let word_count = chapters.iter().map(|ch| ch.word_count).sum();

    Ok(Novel {
        id: slug.clone(),
        slug,
        short_description: short_description(&metadata.description, SHORT_DESCRIPTION_CHARS),
        title: metadata.title,
        author: metadata.author,
        description: metadata.description,
        genres: metadata.genres,
        tags: metadata.tags,
        status: metadata.status,
        rating: metadata.rating,
        cover_path: files.cover.map(|p| p.to_string_lossy().into_owned()),
        total_chapters: chapters.len(),
        word_count,
        chapters,
        last_updated: today.to_string(),
        created_at: today.to_string(),
        folder_path: folder.to_string_lossy().into_owned(),
        folder_name: name,
        content_hash: Some(content_hash),
    })
}

/// Computes the content fingerprint of a description/content file pair.
pub fn fingerprint(description: &[u8], content: &[u8]) -> String {
    let mut context = md5::Context::new();
    context.consume(description);
    context.consume(content);
    format!("{:x}", context.compute())
}

/// Finds the first image file in a folder, by file name order.
pub fn find_cover_image(folder: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(folder).ok()?;
    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_cover_image(path))
        .collect();

    images.sort();
    images.into_iter().next()
}

fn is_cover_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| COVER_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn first_existing(folder: &Path, names: &[&str]) -> Option<PathBuf> {
    names
        .iter()
        .map(|name| folder.join(name))
        .find(|path| path.is_file())
}

fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use tempfile::TempDir;

    const TODAY: &str = "2024-05-01";

    fn write_folder(root: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let folder = root.join(name);
        std::fs::create_dir_all(&folder).unwrap();
        for (file, bytes) in files {
            std::fs::write(folder.join(file), bytes).unwrap();
        }
        folder
    }

    #[test]
    fn test_build_novel() {
        let dir = TempDir::new().unwrap();
        let folder = write_folder(
            dir.path(),
            "示例文件夹",
            &[
                ("描述.txt", "标题: 示例\n作者: 测试\n标签: 狼人,阿尔法"),
                ("正文.txt", "###chapter 1\nHello there\n###chapter 2\nWorld"),
                ("cover.PNG", "png"),
            ],
        );

        let novel = build_novel(&folder, TODAY).unwrap();
        assert_eq!(novel.title, "示例");
        assert_eq!(novel.slug, "示例");
        assert_eq!(novel.id, novel.slug);
        assert_eq!(novel.author, "测试");
        assert_eq!(novel.total_chapters, 2);
        assert_eq!(novel.word_count, 3);
        assert_eq!(novel.folder_name, "示例文件夹");
        assert_eq!(novel.last_updated, TODAY);
        assert!(novel.cover_path.as_deref().unwrap().ends_with("cover.PNG"));
        assert_eq!(novel.content_hash.as_deref().map(str::len), Some(32));
    }

    #[test]
    fn test_legacy_filenames() {
        let dir = TempDir::new().unwrap();
        let folder = write_folder(
            dir.path(),
            "Old Book",
            &[
                ("书籍描述.txt", "An old tale of a dragon."),
                ("书籍正文.txt", "###chapter 1\nOnce"),
            ],
        );

        let novel = build_novel(&folder, TODAY).unwrap();
        assert_eq!(novel.title, "Old Book");
        assert_eq!(novel.slug, "old-book");
        assert!(novel.tags.contains(&"dragon".to_string()));
        assert_eq!(novel.cover_path, None);
    }

    #[test]
    fn test_current_filenames_preferred() {
        let dir = TempDir::new().unwrap();
        let folder = write_folder(
            dir.path(),
            "Both",
            &[
                ("描述.txt", "title: Current"),
                ("书籍描述.txt", "title: Legacy"),
                ("正文.txt", "body"),
            ],
        );

        let files = SourceFiles::resolve(&folder).unwrap();
        assert!(files.description.ends_with("描述.txt"));
        assert!(!files.description.ends_with("书籍描述.txt"));
        assert_eq!(build_novel(&folder, TODAY).unwrap().title, "Current");
    }

    #[test]
    fn test_missing_content_file() {
        let dir = TempDir::new().unwrap();
        let folder = write_folder(dir.path(), "Half", &[("描述.txt", "title: Half")]);

        let err = build_novel(&folder, TODAY).unwrap_err();
        assert!(matches!(err, BuildError::MissingFile { kind: "content", .. }));
        assert!(err.is_missing_file());
    }

    #[test]
    fn test_undecodable_file_counts_as_missing() {
        let dir = TempDir::new().unwrap();
        let folder = write_folder(dir.path(), "Broken", &[("正文.txt", "###chapter 1\nBody")]);
        std::fs::write(folder.join("描述.txt"), [0xFF, 0xFE, 0x00, 0xD8]).unwrap();

        let err = build_novel(&folder, TODAY).unwrap_err();
        assert!(matches!(err, BuildError::Unreadable(ReadError::Decode { .. })));
        assert!(err.is_missing_file());
    }

    #[test]
    fn test_no_chapters() {
        let dir = TempDir::new().unwrap();
        let folder = write_folder(
            dir.path(),
            "Empty",
            &[("描述.txt", "title: Empty"), ("正文.txt", "###\n*****\n###")],
        );

        let err = build_novel(&folder, TODAY).unwrap_err();
        assert!(matches!(err, BuildError::NoChapters { .. }));
        assert!(!err.is_missing_file());
    }

    #[test]
    fn test_fingerprint_uses_raw_bytes() {
        assert_eq!(fingerprint(b"ab", b"c"), fingerprint(b"a", b"bc"));
        assert_ne!(fingerprint(b"abc", b""), fingerprint(b"abc", b" "));
        assert_eq!(fingerprint(b"", b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&NovelStatus::Ongoing).unwrap(), "\"ongoing\"");
        assert_eq!(NovelStatus::default(), NovelStatus::Completed);
    }

    #[test]
    fn test_novel_deserializes_with_missing_fields() {
        let novel: Novel = serde_json::from_str(r#"{"slug": "x", "total_chapters": 3}"#).unwrap();
        assert_eq!(novel.slug, "x");
        assert_eq!(novel.total_chapters, 3);
        assert_eq!(novel.content_hash, None);
    }
}
