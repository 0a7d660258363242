use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use jarmerge_types::{EntryPath, EntryTimes};
use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ArchiveError, ArchiveResult};
use crate::index::{IndexBuilder, INDEX_PATH};
use crate::manifest::{Manifest, MANIFEST_PATH};
use crate::timestamp;

/// Options controlling how the output archive is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriterOptions {
    /// Deflate level 0-9; 0 stores entries uncompressed.
    pub compression_level: u32,
    /// Stamp every entry with [`EntryTimes::epoch`].
    pub zero_timestamps: bool,
    /// Append `META-INF/INDEX.LIST` when finishing.
    pub generate_index: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression_level: 6,
            zero_timestamps: false,
            generate_index: false,
        }
    }
}

/// Result of finishing an output archive.
#[derive(Clone, Debug)]
pub struct WrittenArchive {
    pub path: PathBuf,
    /// Entries written, including manifest, directories and index.
    pub entry_count: usize,
    /// Paths listed in the index, when one was generated.
    pub index: Option<Vec<String>>,
}

/// Writes the merged output archive.
///
/// Entries go to a temporary file next to the target, which replaces the
/// target only in [`ArchiveWriter::finish`]. Dropping an unfinished writer
/// deletes the temporary file and leaves the target untouched.
///
/// The writer refuses to write a path twice and keeps track of every
/// directory and top-level file for the index.
pub struct ArchiveWriter {
    target: PathBuf,
    zip: Option<ZipWriter<NamedTempFile>>,
    options: WriterOptions,
    written: HashSet<EntryPath>,
    index: IndexBuilder,
    entry_count: usize,
}

impl ArchiveWriter {
    /// Create a writer for `target`. Nothing is written to `target` itself
    /// until [`Self::finish`].
    pub fn create(target: &Path, options: WriterOptions) -> ArchiveResult<Self> {
        if options.compression_level > 9 {
            return Err(ArchiveError::InvalidCompressionLevel(
                options.compression_level,
            ));
        }

        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent)?;
        }
        let temp = tempfile::Builder::new()
            .prefix(".jarmerge-")
            .suffix(".tmp")
            .tempfile_in(&parent)?;
        debug!(output = %target.display(), temp = %temp.path().display(), "output archive opened");

        Ok(Self {
            target: target.to_path_buf(),
            zip: Some(ZipWriter::new(temp)),
            options,
            written: HashSet::new(),
            index: IndexBuilder::new(),
            entry_count: 0,
        })
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Returns `true` if `path` has already been written.
    pub fn contains(&self, path: &EntryPath) -> bool {
        self.written.contains(path)
    }

    /// Number of entries written so far.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Write the manifest. Must be the first entry; its `META-INF/`
    /// directory follows it.
    pub fn write_manifest(&mut self, manifest: &Manifest) -> ArchiveResult<()> {
        let path = EntryPath::new(MANIFEST_PATH)?;
        let bytes = manifest.to_bytes();
        let mut sink = self.begin(&path, &EntryTimes::none(), false)?;
        sink.write_all(&bytes)?;
        self.ensure_parents(&path)
    }

    /// Write any ancestor directory of `path` that is not written yet.
    pub fn ensure_parents(&mut self, path: &EntryPath) -> ArchiveResult<()> {
        for parent in path.parent_dirs() {
            if !self.written.contains(&parent) {
                debug!(path = %parent, "synthesized parent directory");
                self.begin(&parent, &EntryTimes::none(), true)?;
            }
        }
        Ok(())
    }

    /// Write a directory entry (and its parents). Returns `false` if the
    /// directory was already present.
    pub fn add_directory(&mut self, path: &EntryPath, times: &EntryTimes) -> ArchiveResult<bool> {
        if self.written.contains(path) {
            return Ok(false);
        }
        self.ensure_parents(path)?;
        self.begin(path, times, true)?;
        Ok(true)
    }

    /// Start a file entry (parents first) and return a sink for its content.
    ///
    /// The entry is complete when the next entry starts or the writer is
    /// finished.
    pub fn start_file(&mut self, path: &EntryPath, times: &EntryTimes) -> ArchiveResult<EntrySink<'_>> {
        if self.written.contains(path) {
            return Err(ArchiveError::DuplicateEntry(path.to_string()));
        }
        self.ensure_parents(path)?;
        self.begin(path, times, true)
    }

    /// Append the index (if requested), write the central directory and move
    /// the archive into place.
    pub fn finish(mut self) -> ArchiveResult<WrittenArchive> {
        let index = if self.options.generate_index {
            let name = self
                .target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let path = EntryPath::new(INDEX_PATH)?;
            self.ensure_parents(&path)?;
            let body = self.index.render(&name);
            let listed = self.index.paths().to_vec();
            let mut sink = self.begin(&path, &EntryTimes::none(), false)?;
            sink.write_all(body.as_bytes())?;
            Some(listed)
        } else {
            None
        };

        let mut zip = self.zip.take().ok_or(ArchiveError::Finished)?;
        let mut temp = zip.finish().map_err(|e| ArchiveError::Zip {
            entry: "<central directory>".into(),
            source: e,
        })?;
        temp.flush()?;
        temp.as_file().sync_all()?;
        temp.persist(&self.target).map_err(|e| e.error)?;
        set_default_permissions(&self.target)?;

        debug!(path = %self.target.display(), entries = self.entry_count, "output archive finished");
        Ok(WrittenArchive {
            path: self.target.clone(),
            entry_count: self.entry_count,
            index,
        })
    }

    fn begin(&mut self, path: &EntryPath, times: &EntryTimes, indexed: bool) -> ArchiveResult<EntrySink<'_>> {
        if self.written.contains(path) {
            return Err(ArchiveError::DuplicateEntry(path.to_string()));
        }
        let times = if self.options.zero_timestamps {
            EntryTimes::uniform(EntryTimes::epoch())
        } else {
            *times
        };
        let method = if path.is_dir() || self.options.compression_level == 0 {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let mut options = FileOptions::default()
            .compression_method(method)
            .last_modified_time(timestamp::to_dos(times.modified))
            .unix_permissions(if path.is_dir() { 0o755 } else { 0o644 });
        if method == CompressionMethod::Deflated {
            options = options.compression_level(Some(self.options.compression_level as i32));
        }

        let zip = self.zip.as_mut().ok_or(ArchiveError::Finished)?;
        let zip_err = |e| ArchiveError::Zip {
            entry: path.to_string(),
            source: e,
        };
        match timestamp::encode_extended(&times) {
            Some(extra) => {
                zip.start_file_with_extra_data(path.as_str(), options)
                    .map_err(zip_err)?;
                zip.write_all(&extra).map_err(|e| ArchiveError::Write {
                    entry: path.to_string(),
                    source: e,
                })?;
                zip.end_extra_data().map_err(zip_err)?;
            }
            None => zip.start_file(path.as_str(), options).map_err(zip_err)?,
        }

        self.written.insert(path.clone());
        if indexed {
            self.index.record(path);
        }
        self.entry_count += 1;
        Ok(EntrySink {
            entry: path.to_string(),
            zip,
        })
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if let Some(zip) = self.zip.take() {
            debug!(output = %self.target.display(), "discarding unfinished output archive");
            // Dropping the zip writer drops the temporary file with it.
            drop(zip);
        }
    }
}

impl std::fmt::Debug for ArchiveWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveWriter")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("entry_count", &self.entry_count)
            .finish()
    }
}

/// Content sink of the entry currently being written.
pub struct EntrySink<'a> {
    entry: String,
    zip: &'a mut ZipWriter<NamedTempFile>,
}

impl EntrySink<'_> {
    /// Path of the entry this sink writes.
    pub fn entry(&self) -> &str {
        &self.entry
    }
}

impl std::fmt::Debug for EntrySink<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntrySink").field("entry", &self.entry).finish()
    }
}

impl Write for EntrySink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.zip.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.zip.flush()
    }
}

#[cfg(unix)]
fn set_default_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Read;

    use chrono::TimeZone;
    use zip::ZipArchive;

    use super::*;

    fn p(raw: &str) -> EntryPath {
        EntryPath::new(raw).unwrap()
    }

    fn names(path: &Path) -> Vec<String> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    fn read(path: &Path, name: &str) -> Vec<u8> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn manifest_first_then_parents_then_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jar");

        let mut writer = ArchiveWriter::create(&out, WriterOptions::default()).unwrap();
        writer.write_manifest(&Manifest::new()).unwrap();
        writer
            .start_file(&p("com/x/Y.class"), &EntryTimes::none())
            .unwrap()
            .write_all(b"yyy")
            .unwrap();
        let written = writer.finish().unwrap();

        assert_eq!(written.entry_count, 5);
        assert!(written.index.is_none());
        assert_eq!(
            names(&out),
            vec!["META-INF/MANIFEST.MF", "META-INF/", "com/", "com/x/", "com/x/Y.class"]
        );
        assert_eq!(read(&out, "com/x/Y.class"), b"yyy");
        assert_eq!(read(&out, "META-INF/MANIFEST.MF"), b"Manifest-Version: 1.0\r\n\r\n");
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            ArchiveWriter::create(&dir.path().join("out.jar"), WriterOptions::default()).unwrap();
        writer.start_file(&p("a"), &EntryTimes::none()).unwrap();
        let err = writer.start_file(&p("a"), &EntryTimes::none()).unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateEntry(_)));
        assert!(writer.add_directory(&p("d/"), &EntryTimes::none()).unwrap());
        assert!(!writer.add_directory(&p("d/"), &EntryTimes::none()).unwrap());
    }

    #[test]
    fn index_without_manifest_gets_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bare.jar");
        let options = WriterOptions {
            generate_index: true,
            ..WriterOptions::default()
        };
        let mut writer = ArchiveWriter::create(&out, options).unwrap();
        writer.start_file(&p("a.txt"), &EntryTimes::none()).unwrap();
        let written = writer.finish().unwrap();

        assert_eq!(names(&out), vec!["a.txt", "META-INF/", "META-INF/INDEX.LIST"]);
        assert_eq!(written.index.unwrap(), vec!["a.txt", "META-INF"]);
    }

    #[test]
    fn sink_debug_names_its_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            ArchiveWriter::create(&dir.path().join("out.jar"), WriterOptions::default()).unwrap();
        let sink = writer.start_file(&p("com/A.class"), &EntryTimes::none()).unwrap();
        assert_eq!(sink.entry(), "com/A.class");
        assert!(format!("{sink:?}").contains("com/A.class"));
    }

    #[test]
    fn zeroed_entries_carry_extended_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jar");
        let options = WriterOptions {
            zero_timestamps: true,
            ..WriterOptions::default()
        };
        let mut writer = ArchiveWriter::create(&out, options).unwrap();
        writer.write_manifest(&Manifest::new()).unwrap();
        writer.start_file(&p("a/b.txt"), &EntryTimes::none()).unwrap();
        writer.finish().unwrap();

        let mut archive = ZipArchive::new(File::open(&out).unwrap()).unwrap();
        for i in 0..archive.len() {
            let file = archive.by_index(i).unwrap();
            let times = timestamp::decode_times(file.last_modified(), file.extra_data());
            assert_eq!(times, EntryTimes::uniform(EntryTimes::epoch()), "{}", file.name());
        }
    }

    #[test]
    fn index_lists_directories_and_top_level_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("app.jar");
        let options = WriterOptions {
            generate_index: true,
            ..WriterOptions::default()
        };

        let mut writer = ArchiveWriter::create(&out, options).unwrap();
        writer.write_manifest(&Manifest::new()).unwrap();
        writer.start_file(&p("com/x/Y.class"), &EntryTimes::none()).unwrap();
        writer.start_file(&p("LICENSE"), &EntryTimes::none()).unwrap();
        writer.add_directory(&p("res/"), &EntryTimes::none()).unwrap();
        let written = writer.finish().unwrap();

        let expected = vec!["META-INF", "com", "com/x", "LICENSE", "res"];
        assert_eq!(written.index.unwrap(), expected);
        assert_eq!(names(&out).last().unwrap(), "META-INF/INDEX.LIST");
        assert_eq!(
            String::from_utf8(read(&out, "META-INF/INDEX.LIST")).unwrap(),
            "JarIndex-Version: 1.0\n\napp.jar\nMETA-INF\ncom\ncom/x\nLICENSE\nres\n"
        );
    }

    #[test]
    fn zero_timestamps_are_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let build = |name: &str, modified: i64| {
            let out = dir.path().join(name);
            let options = WriterOptions {
                zero_timestamps: true,
                ..WriterOptions::default()
            };
            let times = EntryTimes::uniform(chrono::Utc.timestamp_opt(modified, 0).unwrap());
            let mut writer = ArchiveWriter::create(&out, options).unwrap();
            writer.write_manifest(&Manifest::new()).unwrap();
            writer
                .start_file(&p("a/b.txt"), &times)
                .unwrap()
                .write_all(b"content")
                .unwrap();
            writer.finish().unwrap();
            fs::read(out).unwrap()
        };

        assert_eq!(build("one.jar", 1_500_000_000), build("two.jar", 1_700_000_000));
    }

    #[test]
    fn timestamps_are_carried_when_not_zeroed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jar");
        let instant = chrono::Utc.with_ymd_and_hms(2020, 2, 2, 10, 20, 30).unwrap();

        let mut writer = ArchiveWriter::create(&out, WriterOptions::default()).unwrap();
        writer
            .start_file(&p("t.txt"), &EntryTimes::uniform(instant))
            .unwrap();
        writer.finish().unwrap();

        let mut archive = ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let file = archive.by_name("t.txt").unwrap();
        let times = timestamp::decode_times(file.last_modified(), file.extra_data());
        assert_eq!(times.modified, Some(instant));
    }

    #[test]
    fn stored_when_level_zero() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jar");
        let options = WriterOptions {
            compression_level: 0,
            ..WriterOptions::default()
        };
        let mut writer = ArchiveWriter::create(&out, options).unwrap();
        writer
            .start_file(&p("big.txt"), &EntryTimes::none())
            .unwrap()
            .write_all(&[b'a'; 4096])
            .unwrap();
        writer.finish().unwrap();

        let mut archive = ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let file = archive.by_name("big.txt").unwrap();
        assert_eq!(file.compression(), CompressionMethod::Stored);
        assert_eq!(file.compressed_size(), 4096);
    }

    #[test]
    fn invalid_level_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let options = WriterOptions {
            compression_level: 10,
            ..WriterOptions::default()
        };
        let err = ArchiveWriter::create(&dir.path().join("x.jar"), options).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidCompressionLevel(10)));
    }

    #[test]
    fn unfinished_writer_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jar");
        {
            let mut writer = ArchiveWriter::create(&out, WriterOptions::default()).unwrap();
            writer.start_file(&p("a"), &EntryTimes::none()).unwrap();
        }
        assert!(!out.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn finish_replaces_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jar");
        fs::write(&out, b"stale").unwrap();

        let writer = ArchiveWriter::create(&out, WriterOptions::default()).unwrap();
        writer.finish().unwrap();
        assert!(names(&out).is_empty());
    }
}
