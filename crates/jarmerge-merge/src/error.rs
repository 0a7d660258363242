use std::io;
use std::path::PathBuf;

use jarmerge_archive::ArchiveError;
use jarmerge_filter::FilterError;

/// Errors that abort a merge run.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// An input could not be read or the output could not be written.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// The filter set is inconsistent or a coalescer failed.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// The merge configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An input archive does not exist.
    #[error("input archive not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// An input no longer matches what the dry run saw.
    #[error("{} changed during the merge (entry {path})", .archive.display())]
    InputChanged { archive: PathBuf, path: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl MergeError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result alias for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;
