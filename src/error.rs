//! Error types for the Shelfsync library.
//!
//! Uses `thiserror` for structured error definitions. None of these are
//! fatal to a sync run: the library manager decides what to skip and what
//! to report.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for reading and decoding source text files.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The file could not be read from disk
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither UTF-8 nor the detected encoding could decode the bytes
    #[error("Failed to decode {path} (detected {encoding})")]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },
}

/// Error type for description file parsing.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetadataError {
    /// The description file has no content after trimming
    #[error("Description file is empty")]
    Empty,
}

/// Reasons a source folder does not produce a novel.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A required file (description or content) is absent
    #[error("Missing {kind} file in {folder}")]
    MissingFile { folder: String, kind: &'static str },

    /// A required file exists but could not be read or decoded.
    /// Treated the same as a missing file.
    #[error("Unreadable file: {0}")]
    Unreadable(#[from] ReadError),

    /// The description file yielded no metadata
    #[error("Invalid description: {0}")]
    InvalidMetadata(#[from] MetadataError),

    /// The content file yielded zero chapters after splitting
    #[error("No chapters found in {folder}")]
    NoChapters { folder: String },

    /// A parallel build worker panicked or was cancelled
    #[error("Build worker failed: {0}")]
    Worker(String),
}

impl BuildError {
    /// Returns true if this error means a required file is effectively absent.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, BuildError::MissingFile { .. } | BuildError::Unreadable(_))
    }
}

/// Error type for cache and index persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read an artifact
    #[error("Failed to read artifact: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse or serialize JSON
    #[error("Failed to process artifact JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Failed to write an artifact
    #[error("Failed to write {path}: {message}")]
    WriteError { path: PathBuf, message: String },
}

/// Error type for library scans.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// The source directory does not exist
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    /// The source directory could not be listed
    #[error("Failed to list source directory: {0}")]
    ListError(#[from] std::io::Error),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
