use std::io;
use std::path::PathBuf;

use jarmerge_types::TypeError;
use thiserror::Error;
use zip::result::ZipError;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive {archive}: {source}")]
    Open {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed archive {archive}: {source}")]
    Format {
        archive: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("invalid entry name {name:?} in {archive}: {reason}")]
    InvalidEntryName {
        archive: PathBuf,
        name: String,
        reason: String,
    },

    #[error("failed reading {entry} from {archive}: {source}")]
    Read {
        archive: PathBuf,
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error("failed writing {entry}: {source}")]
    Write {
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error("zip writer error on {entry}: {source}")]
    Zip {
        entry: String,
        #[source]
        source: ZipError,
    },

    #[error("invalid entry path: {0}")]
    Path(#[from] TypeError),

    #[error("entry already written: {0}")]
    DuplicateEntry(String),

    #[error("compression level must be 0-9, got {0}")]
    InvalidCompressionLevel(u32),

    #[error("archive writer already finished")]
    Finished,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;
