//! Shelfsync - incremental novel library synchronization.
//!
//! This library provides functionality for:
//! - Parsing free-form description and content files into novels and chapters
//! - Fingerprinting source files and classifying changes between runs
//! - Persisting a full cache and a metadata-only index for page renderers

pub mod changes;
pub mod chapters;
pub mod config;
pub mod console;
pub mod error;
pub mod library;
pub mod logging;
pub mod metadata;
pub mod novel;
pub mod reader;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use changes::{ChangeKind, ChangeSet};
pub use config::Config;
pub use console::Console;
pub use error::{BuildError, ConfigError, LibraryError, MetadataError, ReadError, StoreError};
pub use library::{LibraryManager, ScanReport, SkippedFolder, SyncOutcome};
pub use metadata::NovelMetadata;
pub use novel::{Chapter, Novel, NovelStatus};
pub use store::{IndexRecord, LibraryStore};
