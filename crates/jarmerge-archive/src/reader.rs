use std::fs::File;
use std::io::{self, BufReader, Read};

use jarmerge_types::{ArchiveEntry, EntryPath, SourceArchive};
use zip::ZipArchive;

use crate::error::{ArchiveError, ArchiveResult};
use crate::timestamp;

/// Streams the entries of one input archive in stored order.
///
/// Content is never buffered: each entry's stream is handed to the visitor
/// and closed before the next entry is opened.
pub struct EntryStreamReader {
    source: SourceArchive,
    archive: ZipArchive<BufReader<File>>,
}

impl EntryStreamReader {
    /// Open an archive and read its central directory.
    pub fn open(source: &SourceArchive) -> ArchiveResult<Self> {
        let file = File::open(&source.location).map_err(|e| ArchiveError::Open {
            archive: source.display.clone(),
            source: e,
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| ArchiveError::Format {
            archive: source.display.clone(),
            source: e,
        })?;
        Ok(Self {
            source: source.clone(),
            archive,
        })
    }

    /// The archive being read.
    pub fn source(&self) -> &SourceArchive {
        &self.source
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Visit every entry in stored order.
    ///
    /// The visitor receives the entry metadata and its content stream; it may
    /// read the stream fully, partially, or not at all. Directory entries get
    /// an empty stream. The first error from either side stops the walk.
    pub fn visit<E, F>(&mut self, mut visitor: F) -> Result<(), E>
    where
        E: From<ArchiveError>,
        F: FnMut(&ArchiveEntry, &mut dyn Read) -> Result<(), E>,
    {
        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i).map_err(|e| ArchiveError::Format {
                archive: self.source.display.clone(),
                source: e,
            })?;

            let name = file.name().to_string();
            let parsed = if file.is_dir() {
                EntryPath::dir(&name)
            } else {
                EntryPath::new(&name)
            };
            let path = parsed.map_err(|e| ArchiveError::InvalidEntryName {
                archive: self.source.display.clone(),
                name: name.clone(),
                reason: e.to_string(),
            })?;

            let times = timestamp::decode_times(file.last_modified(), file.extra_data());
            let entry = ArchiveEntry::new(path, file.size(), times);

            if entry.is_dir() {
                visitor(&entry, &mut io::empty())?;
            } else {
                visitor(&entry, &mut file)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for EntryStreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStreamReader")
            .field("source", &self.source)
            .field("entries", &self.archive.len())
            .finish()
    }
}
