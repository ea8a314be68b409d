//! Library synchronization.
//!
//! A sync run loads the previous cache, builds every novel in the source
//! directory, classifies each one against the cache, and writes the new
//! cache and index. The store is owned by the caller and passed in.

use crate::changes::{ChangeSet, classify};
use crate::config::{Config, ScanConfig};
use crate::error::{BuildError, LibraryError, StoreError};
use crate::novel::{Novel, build_novel};
use crate::store::LibraryStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A source folder that did not produce a novel.
#[derive(Debug)]
pub struct SkippedFolder {
    pub folder: String,
    pub error: BuildError,
}

/// Novels built from one pass over the source directory.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Novels keyed by (collision-free) slug.
    pub novels: BTreeMap<String, Novel>,
    /// Folders that were skipped, in folder-name order.
    pub skipped: Vec<SkippedFolder>,
}

/// Result of a sync run.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// Current novels keyed by slug.
    pub novels: BTreeMap<String, Novel>,
    /// Classification against the previous run.
    pub changes: ChangeSet,
    /// Folders that did not produce a novel.
    pub skipped: Vec<SkippedFolder>,
    /// Failures writing the cache or index.
    pub persist_errors: Vec<StoreError>,
}

impl SyncOutcome {
    /// Novels that are new or updated, i.e. whose pages need rebuilding.
    pub fn changed_novels(&self) -> impl Iterator<Item = &Novel> {
        self.changes
            .new
            .iter()
            .chain(&self.changes.updated)
            .filter_map(|slug| self.novels.get(slug))
    }

    /// Returns true when nothing was added, updated or removed.
    pub fn is_up_to_date(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns true when both artifacts were written.
    pub fn is_persisted(&self) -> bool {
        self.persist_errors.is_empty()
    }
}

/// Scans a source directory and keeps the cache and index in sync with it.
#[derive(Debug, Clone)]
pub struct LibraryManager {
    source_dir: PathBuf,
    options: ScanConfig,
}

impl LibraryManager {
    /// Creates a manager with default scan options.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self::with_options(source_dir, ScanConfig::default())
    }

    /// Creates a manager with explicit scan options.
    pub fn with_options(source_dir: impl Into<PathBuf>, options: ScanConfig) -> Self {
        Self {
            source_dir: source_dir.into(),
            options,
        }
    }

    /// Creates a manager from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_options(&config.paths.source_directory, config.scan.clone())
    }

    /// The directory being scanned.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Runs a full sync: load cache, scan, classify, persist.
    pub async fn sync(&self, store: &LibraryStore) -> Result<SyncOutcome, LibraryError> {
        info!(source = %self.source_dir.display(), "Starting library sync");

        let previous = if self.options.force_rebuild {
            info!("Force rebuild: ignoring previous cache");
            BTreeMap::new()
        } else {
            store.load_cache()
        };

        let ScanReport { novels, skipped } = self.scan().await?;
        let changes = classify(&novels, &previous);

        info!(
            new = changes.new.len(),
            updated = changes.updated.len(),
            unchanged = changes.unchanged.len(),
            removed = changes.removed.len(),
            skipped = skipped.len(),
            "Library scan complete"
        );

        let mut persist_errors = Vec::new();
        for result in [store.save_cache(&novels), store.save_index(&novels)] {
            if let Err(e) = result {
                warn!(error = %e, "Failed to persist library state");
                persist_errors.push(e);
            }
        }

        Ok(SyncOutcome {
            novels,
            changes,
            skipped,
            persist_errors,
        })
    }

    /// Builds every novel in the source directory without touching the store.
    pub async fn scan(&self) -> Result<ScanReport, LibraryError> {
        let folders = self.list_folders()?;
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();

        let results = if self.options.parallel {
            build_parallel(folders, &today).await
        } else {
            folders
                .into_iter()
                .map(|folder| {
                    let result = build_novel(&folder, &today);
                    (display_name(&folder), result)
                })
                .collect()
        };

        let mut report = ScanReport::default();
        for (folder, result) in results {
            match result {
                Ok(novel) => {
                    debug!(folder = %folder, slug = %novel.slug, "Built novel");
                    insert_unique(&mut report.novels, novel);
                }
                Err(error) => {
                    warn!(folder = %folder, error = %error, "Skipping folder");
                    report.skipped.push(SkippedFolder { folder, error });
                }
            }
        }

        Ok(report)
    }

    /// Lists novel folders, sorted by name so slug disambiguation is stable.
    fn list_folders(&self) -> Result<Vec<PathBuf>, LibraryError> {
        if !self.source_dir.is_dir() {
            return Err(LibraryError::SourceNotFound(self.source_dir.clone()));
        }

        let mut folders = Vec::new();
        for entry in std::fs::read_dir(&self.source_dir)? {
            let path = entry?.path();
            if path.is_dir() {
                folders.push(path);
            }
        }

        folders.sort();
        Ok(folders)
    }
}

/// Builds folders on blocking worker threads and collects them in input order.
async fn build_parallel(
    folders: Vec<PathBuf>,
    today: &str,
) -> Vec<(String, Result<Novel, BuildError>)> {
    let names: Vec<String> = folders.iter().map(|f| display_name(f)).collect();
    let tasks = folders.into_iter().map(|folder| {
        let today = today.to_string();
        tokio::task::spawn_blocking(move || build_novel(&folder, &today))
    });

    let joined = futures::future::join_all(tasks).await;

    names
        .into_iter()
        .zip(joined)
        .map(|(name, joined)| {
            let result = joined.unwrap_or_else(|e| Err(BuildError::Worker(e.to_string())));
            (name, result)
        })
        .collect()
}

/// Inserts a novel, giving it a `-2`, `-3`, ... suffix if its slug is taken.
fn insert_unique(novels: &mut BTreeMap<String, Novel>, mut novel: Novel) {
    if novels.contains_key(&novel.slug) {
        let base = novel.slug.clone();
        let mut n = 2;
        let mut candidate = format!("{}-{}", base, n);
        while novels.contains_key(&candidate) {
            n += 1;
            candidate = format!("{}-{}", base, n);
        }

        warn!(
            folder = %novel.folder_name,
            slug = %base,
            assigned = %candidate,
            "Slug collision"
        );
        novel.set_slug(candidate);
    }

    novels.insert(novel.slug.clone(), novel);
}

fn display_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::ChangeKind;
    use std::io::Write;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        store: LibraryStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let source = dir.path().join("source");
            std::fs::create_dir_all(&source).unwrap();
            let store = LibraryStore::new(&dir.path().join("dist"));
            Self {
                _dir: dir,
                source,
                store,
            }
        }

        fn add_novel(&self, folder: &str, description: &str, content: &str) -> PathBuf {
            let path = self.source.join(folder);
            std::fs::create_dir_all(&path).unwrap();
            std::fs::write(path.join("描述.txt"), description).unwrap();
            std::fs::write(path.join("正文.txt"), content).unwrap();
            path
        }

        fn seed(&self) {
            self.add_novel(
                "moon",
                "标题: Moon Rise\n作者: A\n标签: alpha,pack",
                "###chapter 1\nThe wolf howled.\n###chapter 2\nThe pack ran.",
            );
            self.add_novel(
                "Ocean Deep",
                "A mermaid discovers a kingdom under the sea.",
                "###Waves crashed.\n*****\nShe dove.",
            );
        }

        fn manager(&self) -> LibraryManager {
            LibraryManager::new(&self.source)
        }
    }

    #[tokio::test]
    async fn test_first_sync_marks_all_new() {
        let fx = Fixture::new();
        fx.seed();

        let outcome = fx.manager().sync(&fx.store).await.unwrap();
        assert_eq!(outcome.changes.new, vec!["moon-rise", "ocean-deep"]);
        assert!(outcome.skipped.is_empty());
        assert!(outcome.is_persisted());
        assert_eq!(outcome.changed_novels().count(), 2);
        assert!(fx.store.cache_path().exists());
        assert!(fx.store.index_path().exists());
    }

    #[tokio::test]
    async fn test_rescan_is_stable() {
        let fx = Fixture::new();
        fx.seed();

        let first = fx.manager().sync(&fx.store).await.unwrap();
        let second = fx.manager().sync(&fx.store).await.unwrap();

        assert!(second.is_up_to_date());
        assert!(second.changes.new.is_empty());
        assert!(second.changes.updated.is_empty());
        assert!(second.changes.removed.is_empty());
        assert_eq!(second.changes.unchanged, vec!["moon-rise", "ocean-deep"]);
        for (slug, novel) in &first.novels {
            assert_eq!(novel.content_hash, second.novels[slug].content_hash);
        }
        assert_eq!(second.changed_novels().count(), 0);
    }

    #[tokio::test]
    async fn test_appended_character_marks_only_that_novel_updated() {
        let fx = Fixture::new();
        fx.seed();
        fx.manager().sync(&fx.store).await.unwrap();

        let content = fx.source.join("moon").join("正文.txt");
        let mut file = std::fs::OpenOptions::new().append(true).open(content).unwrap();
        file.write_all(b"!").unwrap();

        let outcome = fx.manager().sync(&fx.store).await.unwrap();
        assert_eq!(outcome.changes.kind_of("moon-rise"), Some(ChangeKind::Updated));
        assert_eq!(outcome.changes.kind_of("ocean-deep"), Some(ChangeKind::Unchanged));
        let changed: Vec<&str> = outcome.changed_novels().map(|n| n.slug.as_str()).collect();
        assert_eq!(changed, vec!["moon-rise"]);
    }

    #[tokio::test]
    async fn test_removed_folder() {
        let fx = Fixture::new();
        fx.seed();
        fx.manager().sync(&fx.store).await.unwrap();

        std::fs::remove_dir_all(fx.source.join("Ocean Deep")).unwrap();
        let outcome = fx.manager().sync(&fx.store).await.unwrap();

        assert_eq!(outcome.changes.removed, vec!["ocean-deep"]);
        assert_eq!(outcome.changes.unchanged, vec!["moon-rise"]);
        assert!(!outcome.is_up_to_date());
        let index = fx.store.load_index().unwrap();
        assert!(!index.contains_key("ocean-deep"));
        assert!(index.contains_key("moon-rise"));
    }

    #[tokio::test]
    async fn test_chapter_numbering_invariant() {
        let fx = Fixture::new();
        fx.seed();
        fx.add_novel(
            "gaps",
            "title: Gaps",
            "###chapter 1\nOne\n###\n---\n###chapter 5\nTwo\n###=====\n###Three",
        );

        let outcome = fx.manager().sync(&fx.store).await.unwrap();
        for novel in outcome.novels.values() {
            assert_eq!(novel.total_chapters, novel.chapters.len());
            for (idx, chapter) in novel.chapters.iter().enumerate() {
                assert_eq!(chapter.number as usize, idx + 1);
                assert!(!chapter.content.is_empty());
            }
        }
        assert_eq!(outcome.novels["gaps"].chapters.len(), 3);
    }

    #[tokio::test]
    async fn test_skipped_folders_are_not_fatal() {
        let fx = Fixture::new();
        fx.seed();
        std::fs::create_dir_all(fx.source.join("no-files")).unwrap();
        fx.add_novel("blank", "title: Blank", "###\n*****\n###");
        std::fs::write(fx.source.join("stray.txt"), "not a folder").unwrap();

        let outcome = fx.manager().sync(&fx.store).await.unwrap();
        assert_eq!(outcome.novels.len(), 2);

        let skipped: Vec<(&str, bool)> = outcome
            .skipped
            .iter()
            .map(|s| (s.folder.as_str(), s.error.is_missing_file()))
            .collect();
        assert_eq!(skipped, vec![("blank", false), ("no-files", true)]);
    }

    #[tokio::test]
    async fn test_slug_collision_gets_suffix() {
        let fx = Fixture::new();
        fx.add_novel("a", "title: Twin Moons", "###chapter 1\nFirst");
        fx.add_novel("b", "title: Twin  Moons!", "###chapter 1\nSecond");
        fx.add_novel("c", "title: twin moons", "###chapter 1\nThird");

        let outcome = fx.manager().sync(&fx.store).await.unwrap();
        assert_eq!(outcome.novels.len(), 3);
        assert_eq!(outcome.novels["twin-moons"].folder_name, "a");
        assert_eq!(outcome.novels["twin-moons-2"].folder_name, "b");
        assert_eq!(outcome.novels["twin-moons-3"].folder_name, "c");
        assert_eq!(outcome.novels["twin-moons-3"].id, "twin-moons-3");

        let again = fx.manager().sync(&fx.store).await.unwrap();
        assert_eq!(again.changes.unchanged.len(), 3);
    }

    #[tokio::test]
    async fn test_slug_same_across_dialects() {
        let fx = Fixture::new();
        fx.add_novel("Moon Rise", "A tale of the luna.", "###chapter 1\nx");
        let free_text = fx.manager().scan().await.unwrap();

        let fx2 = Fixture::new();
        fx2.add_novel("other", "标题: Moon Rise", "###chapter 1\nx");
        let key_value = fx2.manager().scan().await.unwrap();

        assert_eq!(
            free_text.novels.keys().collect::<Vec<_>>(),
            key_value.novels.keys().collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_force_rebuild_ignores_cache() {
        let fx = Fixture::new();
        fx.seed();
        fx.manager().sync(&fx.store).await.unwrap();

        let options = ScanConfig {
            force_rebuild: true,
            ..ScanConfig::default()
        };
        let outcome = LibraryManager::with_options(&fx.source, options)
            .sync(&fx.store)
            .await
            .unwrap();
        assert_eq!(outcome.changes.new.len(), 2);
        assert!(outcome.changes.unchanged.is_empty());
    }

    #[tokio::test]
    async fn test_sequential_matches_parallel() {
        let fx = Fixture::new();
        fx.seed();

        let sequential = ScanConfig {
            parallel: false,
            ..ScanConfig::default()
        };
        let a = LibraryManager::with_options(&fx.source, sequential)
            .scan()
            .await
            .unwrap();
        let b = fx.manager().scan().await.unwrap();
        assert_eq!(a.novels, b.novels);
    }

    #[tokio::test]
    async fn test_corrupt_cache_treated_as_empty() {
        let fx = Fixture::new();
        fx.seed();
        fx.manager().sync(&fx.store).await.unwrap();
        std::fs::write(fx.store.cache_path(), "garbage").unwrap();

        let outcome = fx.manager().sync(&fx.store).await.unwrap();
        assert_eq!(outcome.changes.new.len(), 2);
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let fx = Fixture::new();
        fx.seed();
        let blocker = fx.source.join("moon").join("正文.txt");
        let store = LibraryStore::new(&blocker.join("out"));

        let outcome = fx.manager().sync(&store).await.unwrap();
        assert_eq!(outcome.persist_errors.len(), 2);
        assert!(!outcome.is_persisted());
        assert_eq!(outcome.novels.len(), 2);
        assert_eq!(outcome.changes.new.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_source_directory() {
        let fx = Fixture::new();
        let manager = LibraryManager::new(fx.source.join("absent"));
        let err = manager.sync(&fx.store).await.unwrap_err();
        assert!(matches!(err, LibraryError::SourceNotFound(_)));
    }
}
