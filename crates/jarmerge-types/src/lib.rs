//! Foundation types for jarmerge.
//!
//! Every jarmerge library crate depends on `jarmerge-types`. The types here are
//! plain values: they carry no I/O and never touch an archive themselves.
//!
//! # Key Types
//!
//! - [`EntryPath`]: normalized '/'-delimited logical path inside an archive
//! - [`ArchiveEntry`]: metadata of one entry as surfaced by the reader
//! - [`EntryTimes`]: optional creation/access/modification timestamps
//! - [`SourceArchive`]: one input archive and its position in merge order
//! - [`ContentDigest`]: BLAKE3 digest of an entry's content

pub mod digest;
pub mod entry;
pub mod error;
pub mod path;
pub mod source;

pub use digest::ContentDigest;
pub use entry::{ArchiveEntry, EntryTimes};
pub use error::TypeError;
pub use path::EntryPath;
pub use source::SourceArchive;
