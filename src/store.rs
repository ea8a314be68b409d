//! Persistent cache and index artifacts.
//!
//! The **cache** holds full novel records with each chapter body cut to a
//! short preview. It is the previous state for the next scan.
//! The **index** holds metadata only (no chapter bodies) and is what page
//! renderers read. Both are JSON objects keyed by slug and are rewritten in
//! full on every save.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::novel::{Novel, NovelStatus};
use crate::utils::truncate_chars;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Chapter entry in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub number: u32,
    pub title: String,
    pub word_count: usize,
    pub publish_date: String,
}

/// Novel entry in the index. Field names are the renderer contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
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
    pub total_chapters: usize,
    pub last_updated: String,
    pub chapters: Vec<ChapterSummary>,
}

impl From<&Novel> for IndexRecord {
    fn from(novel: &Novel) -> Self {
        Self {
            id: novel.id.clone(),
            slug: novel.slug.clone(),
            title: novel.title.clone(),
            author: novel.author.clone(),
            description: novel.description.clone(),
            short_description: novel.short_description.clone(),
            genres: novel.genres.clone(),
            tags: novel.tags.clone(),
            status: novel.status,
            rating: novel.rating,
            cover_path: novel.cover_path.clone(),
            total_chapters: novel.total_chapters,
            last_updated: novel.last_updated.clone(),
            chapters: novel
                .chapters
                .iter()
                .map(|ch| ChapterSummary {
                    number: ch.number,
                    title: ch.title.clone(),
                    word_count: ch.word_count,
                    publish_date: ch.publish_date.clone(),
                })
                .collect(),
        }
    }
}

/// Cache and index files for one output directory.
#[derive(Debug, Clone)]
pub struct LibraryStore {
    cache_path: PathBuf,
    index_path: PathBuf,
    preview_chars: usize,
}

impl LibraryStore {
    /// Default cache file name.
    pub const CACHE_FILENAME: &'static str = "novels-cache.json";

    /// Default index file name.
    pub const INDEX_FILENAME: &'static str = "novels-index.json";

    /// Default number of characters kept from each chapter in the cache.
    pub const PREVIEW_CHARS: usize = 100;

    /// Creates a store with the default file names inside `output_dir`.
    pub fn new(output_dir: &Path) -> Self {
        Self {
            cache_path: output_dir.join(Self::CACHE_FILENAME),
            index_path: output_dir.join(Self::INDEX_FILENAME),
            preview_chars: Self::PREVIEW_CHARS,
        }
    }

    /// Creates a store from configuration.
    pub fn from_config(output_dir: &Path, config: &StoreConfig) -> Self {
        Self {
            cache_path: output_dir.join(&config.cache_filename),
            index_path: output_dir.join(&config.index_filename),
            preview_chars: config.chapter_preview_chars,
        }
    }

    /// Path of the cache file.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Path of the index file.
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Loads the previous scan's novels.
    ///
    /// A missing or unreadable cache is an empty previous state, never an error.
    pub fn load_cache(&self) -> BTreeMap<String, Novel> {
        if !self.cache_path.exists() {
            return BTreeMap::new();
        }

        match read_json(&self.cache_path) {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "Ignoring unreadable cache"
                );
                BTreeMap::new()
            }
        }
    }

    /// Writes the cache with chapter bodies cut to the preview length.
    pub fn save_cache(&self, novels: &BTreeMap<String, Novel>) -> Result<(), StoreError> {
        let cache: BTreeMap<&str, Novel> = novels
            .iter()
            .map(|(slug, novel)| (slug.as_str(), self.cache_record(novel)))
            .collect();

        write_json(&self.cache_path, &cache)?;
        tracing::info!(path = %self.cache_path.display(), novels = cache.len(), "Saved cache");
        Ok(())
    }

    /// Writes the metadata-only index.
    pub fn save_index(&self, novels: &BTreeMap<String, Novel>) -> Result<(), StoreError> {
        let index: BTreeMap<&str, IndexRecord> = novels
            .iter()
            .map(|(slug, novel)| (slug.as_str(), IndexRecord::from(novel)))
            .collect();

        write_json(&self.index_path, &index)?;
        tracing::info!(path = %self.index_path.display(), novels = index.len(), "Saved index");
        Ok(())
    }

    /// Reads the index back.
    pub fn load_index(&self) -> Result<BTreeMap<String, IndexRecord>, StoreError> {
        read_json(&self.index_path)
    }

    /// Returns index records for a listing page, most recently updated first.
    pub fn novels_for_homepage(&self) -> Result<Vec<IndexRecord>, StoreError> {
        let mut novels: Vec<IndexRecord> = self.load_index()?.into_values().collect();
        novels.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(novels)
    }

    fn cache_record(&self, novel: &Novel) -> Novel {
        let mut record = novel.clone();
        for chapter in &mut record.chapters {
            let preview = truncate_chars(&chapter.content, self.preview_chars);
            if preview.len() < chapter.content.len() {
                chapter.content = preview.to_string();
            }
        }
        record
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let write_error = |e: std::io::Error| StoreError::WriteError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).map_err(write_error)
}
