//! The dry-run phase.
//!
//! [`plan`] walks every input once, asks the filters about every entry and
//! records the outcome in a [`MergePlan`]. Nothing is written. Coalescers
//! absorb their fragments here, and every plain file is hashed so content
//! conflicts are known before the write phase starts.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use jarmerge_archive::{drain, ArchiveError, EntryStreamReader, Manifest};
use jarmerge_digest::ContentHasher;
use jarmerge_filter::{Claim, Coalescer, FilterDecision, FilterError, FilterSet, Fragment};
use jarmerge_types::{ArchiveEntry, ContentDigest, EntryPath, EntryTimes, SourceArchive};
use tracing::{debug, info_span, trace};

use crate::collector::HashCollector;
use crate::config::MergeConfig;
use crate::error::{MergeError, MergeResult};
use crate::manifest::{is_index_list, is_manifest};

/// Most bytes of an input manifest read while looking for `Main-Class`.
pub const MANIFEST_READ_LIMIT: u64 = 64 * 1024;

/// One coalescer created during the dry run.
pub struct CoalescerSlot {
    /// Name of the filter that created it.
    pub filter: String,
    /// The claim that created it.
    pub claim: Claim,
    /// Times of the first fragment; used for the merged entry.
    pub times: EntryTimes,
    /// `(path, archive ordinal)` pairs absorbed, in absorption order.
    pub members: Vec<(EntryPath, usize)>,
    pub coalescer: Box<dyn Coalescer>,
}

impl std::fmt::Debug for CoalescerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescerSlot")
            .field("filter", &self.filter)
            .field("claim", &self.claim)
            .field("members", &self.members)
            .finish()
    }
}

/// Everything the dry run decided.
///
/// Produced by [`plan`] and moved into the write phase, which reads the
/// decisions and never re-runs a filter.
#[derive(Debug, Default)]
pub struct MergePlan {
    pub(crate) skip: HashSet<EntryPath>,
    pub(crate) first_seen: HashMap<EntryPath, usize>,
    pub(crate) slots: Vec<CoalescerSlot>,
    pub(crate) claims: HashMap<(EntryPath, usize), usize>,
    pub(crate) outputs: HashMap<EntryPath, usize>,
    pub(crate) digests: HashMap<(EntryPath, usize), ContentDigest>,
    pub(crate) entry_counts: Vec<usize>,
    pub(crate) main_class: Option<String>,
    /// Input `META-INF/INDEX.LIST` entries are dropped; the output gets a
    /// generated one.
    pub(crate) reserve_index: bool,
    pub(crate) collector: HashCollector,
    pub(crate) filters: Vec<String>,
}

impl MergePlan {
    /// Paths omitted for the whole merge.
    pub fn is_skipped(&self, path: &EntryPath) -> bool {
        self.skip.contains(path)
    }

    /// Ordinal of the first archive holding plain `path`.
    pub fn first_contributor(&self, path: &EntryPath) -> Option<usize> {
        self.first_seen.get(path).copied()
    }

    /// Whether archive `ordinal`'s entry at `path` was claimed by a coalescer.
    pub fn is_claimed(&self, path: &EntryPath, ordinal: usize) -> bool {
        self.claims.contains_key(&(path.clone(), ordinal))
    }

    /// Coalescers created, in creation order.
    pub fn coalescers(&self) -> &[CoalescerSlot] {
        &self.slots
    }

    /// Main class of the first input manifest that declared one.
    pub fn inherited_main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    /// Content digests observed per path.
    pub fn collector(&self) -> &HashCollector {
        &self.collector
    }

    /// Total number of input entries seen.
    pub fn entries_total(&self) -> usize {
        self.entry_counts.iter().sum()
    }

    /// Whether `path` is a location the writer fills itself.
    pub fn is_reserved(&self, path: &EntryPath) -> bool {
        is_manifest(path) || (self.reserve_index && is_index_list(path))
    }

    /// Names of the filters that were consulted, in order.
    pub fn filter_names(&self) -> &[String] {
        &self.filters
    }
}

/// Run the dry-run phase over `sources` in order.
pub fn plan(
    sources: &[SourceArchive],
    filters: &FilterSet,
    config: &MergeConfig,
) -> MergeResult<MergePlan> {
    let mut planner = Planner {
        filters,
        plan: MergePlan {
            filters: filters.names().into_iter().map(String::from).collect(),
            reserve_index: config.generate_index,
            ..MergePlan::default()
        },
        by_identity: HashMap::new(),
    };

    for source in sources {
        let _span = info_span!("dry_run", archive = %source).entered();
        let mut reader = EntryStreamReader::open(source)?;
        let mut count = 0usize;
        reader.visit(|entry, content| -> MergeResult<()> {
            count += 1;
            planner.observe(source, entry, content)
        })?;
        debug!(entries = count, "archive planned");
        planner.plan.entry_counts.push(count);
    }

    let plan = planner.plan;
    debug!(
        skipped = plan.skip.len(),
        coalescers = plan.slots.len(),
        paths = plan.first_seen.len(),
        "dry run complete"
    );
    Ok(plan)
}

struct Planner<'f> {
    filters: &'f FilterSet,
    plan: MergePlan,
    by_identity: HashMap<(usize, String), usize>,
}

impl Planner<'_> {
    fn observe(
        &mut self,
        source: &SourceArchive,
        entry: &ArchiveEntry,
        content: &mut dyn Read,
    ) -> MergeResult<()> {
        let path = &entry.path;

        if is_manifest(path) {
            if self.plan.main_class.is_none() {
                let mut bytes = Vec::new();
                Read::take(content, MANIFEST_READ_LIMIT)
                    .read_to_end(&mut bytes)
                    .map_err(|e| read_error(source, path, e))?;
                if let Some(main_class) = Manifest::parse(&bytes).main_class() {
                    debug!(main_class, archive = %source, "inherited main class");
                    self.plan.main_class = Some(main_class.trim().to_string());
                }
            }
            return Ok(());
        }

        if self.plan.is_reserved(path) {
            trace!(path = %path, "reserved for the generated index");
            return Ok(());
        }

        if self.plan.skip.contains(path) {
            trace!(path = %path, "already skip-listed");
            return Ok(());
        }

        match self.filters.evaluate(entry, source) {
            FilterDecision::Omit { filter } => {
                debug!(path = %path, filter = self.filter_name(filter), "skip-listed");
                self.plan.skip.insert(path.clone());
            }
            FilterDecision::Claim { filter, claim } => {
                self.absorb(source, entry, content, filter, claim)?;
            }
            FilterDecision::Defer => {
                if let Some(&first) = self.plan.first_seen.get(path) {
                    if first != source.ordinal && !entry.is_dir() {
                        trace!(path = %path, first, "duplicate path");
                    }
                } else {
                    self.plan.first_seen.insert(path.clone(), source.ordinal);
                }
                if !entry.is_dir() {
                    let mut hashing = ContentHasher::ENTRY.reader(content);
                    drain(&mut hashing, entry.size).map_err(|e| read_error(source, path, e))?;
                    let (digest, _) = hashing.finish();
                    self.record(source, path, digest);
                }
            }
        }
        Ok(())
    }

    fn absorb(
        &mut self,
        source: &SourceArchive,
        entry: &ArchiveEntry,
        content: &mut dyn Read,
        filter: usize,
        claim: Claim,
    ) -> MergeResult<()> {
        let filter_name = self.filter_name(filter).to_string();
        let key = (filter, claim.identity.clone());
        let slot = match self.by_identity.get(&key) {
            Some(&slot) => slot,
            None => {
                if let Some(&other) = self.plan.outputs.get(&claim.output_path) {
                    return Err(FilterError::config(format!(
                        "filter '{}' and filter '{}' both produce {}",
                        filter_name, self.plan.slots[other].filter, claim.output_path
                    ))
                    .into());
                }
                let coalescer = self
                    .filters
                    .get(filter)
                    .ok_or_else(|| MergeError::config(format!("no filter at position {filter}")))?
                    .coalescer(&claim)?;
                let slot = self.plan.slots.len();
                debug!(
                    filter = %filter_name,
                    identity = %claim.identity,
                    output = %claim.output_path,
                    "coalescer created"
                );
                self.plan.outputs.insert(claim.output_path.clone(), slot);
                self.plan.slots.push(CoalescerSlot {
                    filter: filter_name.clone(),
                    claim,
                    times: entry.times,
                    members: Vec::new(),
                    coalescer,
                });
                self.by_identity.insert(key, slot);
                slot
            }
        };

        let mut hashing = ContentHasher::ENTRY.reader(content);
        let target = &mut self.plan.slots[slot];
        target
            .coalescer
            .absorb(Fragment {
                entry,
                source,
                content: &mut hashing,
            })
            .map_err(|e| FilterError::Absorb {
                filter: filter_name.clone(),
                path: entry.path.clone(),
                source: e,
            })?;
        drain(&mut hashing, entry.size).map_err(|e| read_error(source, &entry.path, e))?;
        let (digest, _) = hashing.finish();
        target.members.push((entry.path.clone(), source.ordinal));
        let output_path = target.claim.output_path.clone();

        self.plan
            .claims
            .insert((entry.path.clone(), source.ordinal), slot);
        self.plan.collector.exclude(&entry.path);
        self.plan.collector.exclude(&output_path);
        self.record(source, &entry.path, digest);
        trace!(path = %entry.path, filter = %filter_name, "fragment absorbed");
        Ok(())
    }

    /// Record a digest. When one archive holds the same path twice, the
    /// first occurrence is the one the write phase copies, so its digest is
    /// the one kept for verification.
    fn record(&mut self, source: &SourceArchive, path: &EntryPath, digest: ContentDigest) {
        self.plan.collector.record(path, digest, source.ordinal);
        self.plan
            .digests
            .entry((path.clone(), source.ordinal))
            .or_insert(digest);
    }

    fn filter_name(&self, index: usize) -> &str {
        self.filters.get(index).map(|f| f.name()).unwrap_or("?")
    }
}

fn read_error(source: &SourceArchive, path: &EntryPath, e: std::io::Error) -> MergeError {
    ArchiveError::Read {
        archive: source.display.clone(),
        entry: path.to_string(),
        source: e,
    }
    .into()
}
