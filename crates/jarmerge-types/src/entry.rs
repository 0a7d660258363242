use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::path::EntryPath;

/// Creation, access and modification time of an entry.
///
/// Every field is optional: ZIP only guarantees a (DOS) modification time,
/// and even that is absent for synthesized entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTimes {
    pub created: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl EntryTimes {
    /// No timestamps at all.
    pub const fn none() -> Self {
        Self {
            created: None,
            accessed: None,
            modified: None,
        }
    }

    /// All three fields set to the same instant.
    pub fn uniform(at: DateTime<Utc>) -> Self {
        Self {
            created: Some(at),
            accessed: Some(at),
            modified: Some(at),
        }
    }

    /// The fixed epoch used for reproducible output: 1980-01-01T00:00:00Z,
    /// the earliest instant a ZIP (DOS) timestamp can represent.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.created.is_none() && self.accessed.is_none() && self.modified.is_none()
    }
}

/// Metadata of one entry in an input archive.
///
/// Owned transiently by the reader while the entry is visited; output entries
/// copy what they need from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Normalized logical path.
    pub path: EntryPath,
    /// Declared uncompressed size in bytes (zero for directories).
    pub size: u64,
    /// Timestamps carried by the entry.
    pub times: EntryTimes,
}

impl ArchiveEntry {
    /// Create an entry; directory paths always report a zero size.
    pub fn new(path: EntryPath, size: u64, times: EntryTimes) -> Self {
        let size = if path.is_dir() { 0 } else { size };
        Self { path, size, times }
    }

    /// Returns `true` if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_dos_epoch() {
        assert_eq!(EntryTimes::epoch().to_rfc3339(), "1980-01-01T00:00:00+00:00");
    }

    #[test]
    fn uniform_sets_all_fields() {
        let times = EntryTimes::uniform(EntryTimes::epoch());
        assert_eq!(times.created, times.modified);
        assert_eq!(times.accessed, times.modified);
        assert!(!times.is_empty());
        assert!(EntryTimes::none().is_empty());
    }

    #[test]
    fn directories_have_zero_size() {
        let dir = ArchiveEntry::new(EntryPath::new("com/").unwrap(), 42, EntryTimes::none());
        assert!(dir.is_dir());
        assert_eq!(dir.size, 0);

        let file = ArchiveEntry::new(EntryPath::new("com/A").unwrap(), 42, EntryTimes::none());
        assert!(!file.is_dir());
        assert_eq!(file.size, 42);
    }
}
