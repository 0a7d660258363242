//! The write phase.
//!
//! [`execute`] consumes a [`MergePlan`] and walks the inputs a second time in
//! the same order, writing every entry the plan left standing. Coalescers are
//! emitted where their output path is first reached.

use std::collections::HashMap;
use std::io::Read;

use jarmerge_archive::{
    copy_bounded, ArchiveError, ArchiveWriter, CopyError, EntryStreamReader, WriterOptions,
    WrittenArchive,
};
use jarmerge_digest::ContentHasher;
use jarmerge_filter::FilterError;
use jarmerge_types::{ArchiveEntry, ContentDigest, EntryPath, SourceArchive};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, trace, warn};

use crate::collector::archive_names;
use crate::config::MergeConfig;
use crate::error::{MergeError, MergeResult};
use crate::manifest::{is_index_list, is_manifest, OutputManifest};
use crate::plan::{CoalescerSlot, MergePlan};

/// How the input entries were disposed of.
///
/// Every input entry lands in exactly one bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCounts {
    /// Entries read from the inputs.
    pub total: usize,
    /// Omitted by a filter, or an input manifest or index the output
    /// replaces.
    pub skipped: usize,
    /// Fed to a coalescer.
    pub coalesced: usize,
    /// Copied through to the output.
    pub written: usize,
    /// Dropped because an earlier archive already supplied the path.
    pub duplicates: usize,
}

impl EntryCounts {
    /// Sum of the disposition buckets; equals `total` after a merge.
    pub fn accounted(&self) -> usize {
        self.skipped + self.coalesced + self.written + self.duplicates
    }
}

/// What the write phase produced.
#[derive(Debug)]
pub struct WriteOutcome {
    pub archive: WrittenArchive,
    pub counts: EntryCounts,
    pub main_class: Option<String>,
}

/// Run the write phase for a finished plan.
pub fn execute(
    plan: MergePlan,
    sources: &[SourceArchive],
    config: &MergeConfig,
) -> MergeResult<WriteOutcome> {
    let manifest =
        OutputManifest::resolve(config.main_class.as_deref(), plan.inherited_main_class());
    let mut writer = ArchiveWriter::create(
        &config.output_path,
        WriterOptions {
            compression_level: config.compression_level,
            zero_timestamps: config.zero_timestamps,
            generate_index: config.generate_index,
        },
    )?;
    writer.write_manifest(&manifest.to_manifest())?;

    let MergePlan {
        skip,
        slots,
        claims,
        outputs,
        digests,
        entry_counts,
        reserve_index,
        ..
    } = plan;

    let mut state = WriteState {
        writer,
        names: archive_names(sources),
        pending: slots.into_iter().map(Some).collect(),
        winners: HashMap::new(),
        counts: EntryCounts::default(),
    };

    for (position, source) in sources.iter().enumerate() {
        let _span = info_span!("write", archive = %source).entered();
        let mut reader = EntryStreamReader::open(source)?;
        let expected = entry_counts.get(position).copied();
        if expected != Some(reader.len()) {
            return Err(MergeError::InputChanged {
                archive: source.display.clone(),
                path: format!("<{} entries>", reader.len()),
            });
        }

        reader.visit(|entry, content| -> MergeResult<()> {
            state.counts.total += 1;
            let path = &entry.path;

            if is_manifest(path) || (reserve_index && is_index_list(path)) {
                state.counts.skipped += 1;
                return Ok(());
            }
            if let Some(&slot) = claims.get(&(path.clone(), source.ordinal)) {
                state.emit(slot)?;
                state.counts.coalesced += 1;
                return Ok(());
            }
            if skip.contains(path) {
                debug!(path = %path, "omitted");
                state.counts.skipped += 1;
                return Ok(());
            }
            if let Some(&slot) = outputs.get(path) {
                state.emit(slot)?;
                warn!(
                    path = %path,
                    archive = %source,
                    "entry dropped; path is produced by a coalescing filter"
                );
                state.counts.duplicates += 1;
                return Ok(());
            }
            if let Some(&winner) = state.winners.get(path) {
                if !entry.is_dir() {
                    warn!(
                        path = %path,
                        kept = %state.name(winner),
                        dropped = %state.name(source.ordinal),
                        "duplicate entry dropped"
                    );
                }
                state.counts.duplicates += 1;
                return Ok(());
            }

            if entry.is_dir() {
                state.winners.insert(path.clone(), source.ordinal);
                if state.writer.add_directory(path, &entry.times)? {
                    state.counts.written += 1;
                } else {
                    // Already synthesized as the parent of an earlier entry.
                    state.counts.duplicates += 1;
                }
                return Ok(());
            }

            let expected = digests
                .get(&(path.clone(), source.ordinal))
                .copied()
                .ok_or_else(|| changed(source, path))?;
            state.copy_through(source, entry, content, expected)?;
            state.winners.insert(path.clone(), source.ordinal);
            state.counts.written += 1;
            Ok(())
        })?;
    }

    // Every slot has at least one claimed member, so each was reached above.
    let leftover = state.pending.iter().filter(|s| s.is_some()).count();
    if leftover > 0 {
        return Err(MergeError::config(format!(
            "{leftover} coalesced entries were never reached"
        )));
    }

    let WriteState { writer, counts, .. } = state;
    let archive = writer.finish()?;
    debug!(
        output = %archive.path.display(),
        entries = archive.entry_count,
        written = counts.written,
        "write phase complete"
    );
    Ok(WriteOutcome {
        archive,
        counts,
        main_class: manifest.main_class().map(String::from),
    })
}

/// Bookkeeping owned by the write phase.
struct WriteState {
    writer: ArchiveWriter,
    names: Vec<String>,
    pending: Vec<Option<CoalescerSlot>>,
    winners: HashMap<EntryPath, usize>,
    counts: EntryCounts,
}

impl WriteState {
    fn name(&self, ordinal: usize) -> &str {
        self.names.get(ordinal).map(String::as_str).unwrap_or("?")
    }

    /// Write coalescer `slot` unless it has been written already.
    fn emit(&mut self, slot: usize) -> MergeResult<()> {
        let Some(CoalescerSlot {
            filter,
            claim,
            times,
            members,
            coalescer,
        }) = self.pending.get_mut(slot).and_then(Option::take)
        else {
            return Ok(());
        };

        let path = claim.output_path;
        let mut sink = self.writer.start_file(&path, &times)?;
        coalescer.emit(&mut sink).map_err(|e| FilterError::Emit {
            filter: filter.clone(),
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path, filter = %filter, fragments = members.len(), "coalesced entry written");
        Ok(())
    }

    fn copy_through(
        &mut self,
        source: &SourceArchive,
        entry: &ArchiveEntry,
        content: &mut dyn Read,
        expected: ContentDigest,
    ) -> MergeResult<()> {
        let path = &entry.path;
        let mut hashing = ContentHasher::ENTRY.reader(content);
        let mut sink = self.writer.start_file(path, &entry.times)?;
        copy_bounded(&mut hashing, &mut sink, entry.size).map_err(|e| match e {
            CopyError::Read(e) => ArchiveError::Read {
                archive: source.display.clone(),
                entry: path.to_string(),
                source: e,
            },
            CopyError::Write(e) => ArchiveError::Write {
                entry: path.to_string(),
                source: e,
            },
        })?;
        let (digest, bytes) = hashing.finish();
        if digest != expected {
            return Err(changed(source, path));
        }
        trace!(path = %path, bytes, "copied");
        Ok(())
    }
}

fn changed(source: &SourceArchive, path: &EntryPath) -> MergeError {
    MergeError::InputChanged {
        archive: source.display.clone(),
        path: path.to_string(),
    }
}
