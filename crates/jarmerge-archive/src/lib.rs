//! Archive I/O for jarmerge.
//!
//! Reads input JARs one entry at a time and writes the merged output with
//! reproducible headers.
//!
//! # Architecture
//!
//! - **EntryStreamReader**: visits entries in stored order with a scoped,
//!   once-readable content stream per entry
//! - **ArchiveWriter**: writes the output through a temporary file, manifest
//!   first, parent directories on demand, optional `INDEX.LIST` last
//! - **Manifest**: main-section manifest codec with 72-byte line wrapping
//! - **IndexBuilder**: collects the paths listed by `INDEX.LIST`
//! - **timestamp**: DOS and extended-timestamp (`0x5455`) conversions
//! - **copy**: bounded-buffer streaming shared by every content transfer

pub mod copy;
pub mod error;
pub mod index;
pub mod manifest;
pub mod reader;
pub mod timestamp;
pub mod writer;

pub use copy::{copy_bounded, drain, CopyError, TRANSFER_CAP};
pub use error::{ArchiveError, ArchiveResult};
pub use index::{IndexBuilder, INDEX_PATH};
pub use manifest::{Manifest, MANIFEST_PATH};
pub use reader::EntryStreamReader;
pub use writer::{ArchiveWriter, EntrySink, WriterOptions, WrittenArchive};
