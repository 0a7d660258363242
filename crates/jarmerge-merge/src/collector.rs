use std::collections::{HashMap, HashSet};

use jarmerge_types::{ContentDigest, EntryPath, SourceArchive};
use serde::{Deserialize, Serialize};

/// One distinct content seen for a conflicting path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictVariant {
    /// Hex digest of the content.
    pub digest: String,
    /// Archives that contributed this content, in merge order.
    pub archives: Vec<String>,
}

/// A path whose inputs disagree on its content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentConflict {
    pub path: String,
    /// Variants in the order they were first seen; the first one is what the
    /// output holds.
    pub variants: Vec<ConflictVariant>,
}

impl ContentConflict {
    /// One-line description for diagnostics.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .variants
            .iter()
            .map(|v| format!("{} in {}", &v.digest[..v.digest.len().min(12)], v.archives.join(", ")))
            .collect();
        format!("{}: {}", self.path, parts.join("; "))
    }
}

/// Records which archives contributed which content for every path.
///
/// Purely diagnostic: nothing here changes what the merge writes.
#[derive(Clone, Debug, Default)]
pub struct HashCollector {
    order: Vec<EntryPath>,
    observed: HashMap<EntryPath, Vec<(ContentDigest, Vec<usize>)>>,
    excluded: HashSet<EntryPath>,
}

impl HashCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that archive `ordinal` holds `digest` at `path`.
    pub fn record(&mut self, path: &EntryPath, digest: ContentDigest, ordinal: usize) {
        if !self.observed.contains_key(path) {
            self.order.push(path.clone());
        }
        let variants = self.observed.entry(path.clone()).or_default();
        match variants.iter_mut().find(|(d, _)| *d == digest) {
            Some((_, archives)) => {
                if !archives.contains(&ordinal) {
                    archives.push(ordinal);
                }
            }
            None => variants.push((digest, vec![ordinal])),
        }
    }

    /// Leave `path` out of conflict reporting; its divergence is resolved
    /// elsewhere.
    pub fn exclude(&mut self, path: &EntryPath) {
        self.excluded.insert(path.clone());
    }

    /// Distinct digests recorded for `path`, in first-seen order.
    pub fn digests(&self, path: &EntryPath) -> Vec<ContentDigest> {
        self.observed
            .get(path)
            .map(|v| v.iter().map(|(d, _)| *d).collect())
            .unwrap_or_default()
    }

    /// Number of paths observed.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Every non-excluded path with more than one distinct digest.
    ///
    /// Archives are named by bare file name when those are unique among
    /// `sources`, by their full path otherwise.
    pub fn conflicts(&self, sources: &[SourceArchive]) -> Vec<ContentConflict> {
        let names = archive_names(sources);
        self.order
            .iter()
            .filter(|path| !self.excluded.contains(*path))
            .filter_map(|path| {
                let variants = self.observed.get(path)?;
                (variants.len() > 1).then(|| ContentConflict {
                    path: path.to_string(),
                    variants: variants
                        .iter()
                        .map(|(digest, ordinals)| ConflictVariant {
                            digest: digest.to_hex(),
                            archives: ordinals
                                .iter()
                                .map(|o| names.get(*o).cloned().unwrap_or_else(|| format!("#{o}")))
                                .collect(),
                        })
                        .collect(),
                })
            })
            .collect()
    }
}

/// Display names for `sources`, indexed by ordinal.
pub fn archive_names(sources: &[SourceArchive]) -> Vec<String> {
    let mut names = vec![String::new(); sources.iter().map(|s| s.ordinal + 1).max().unwrap_or(0)];
    let bare: Vec<String> = sources.iter().map(|s| s.file_name()).collect();
    let unique = bare.iter().collect::<HashSet<_>>().len() == bare.len();
    for (source, short) in sources.iter().zip(bare) {
        names[source.ordinal] = if unique { short } else { source.to_string() };
    }
    names
}
