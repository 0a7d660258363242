use std::io::{Read, Write};

use jarmerge_types::{ArchiveEntry, EntryPath, SourceArchive};

use crate::error::{FilterError, FilterResult};

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

/// A filter's request to coalesce an entry.
///
/// Entries whose claims share the same filter and `identity` are fed to the
/// same coalescer, whatever archive they come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Claim {
    /// Filter-defined identity of the coalescer.
    pub identity: String,
    /// Where the merged result is written.
    pub output_path: EntryPath,
}

impl Claim {
    /// A claim whose identity and output are the entry path itself.
    pub fn same_path(path: &EntryPath) -> Self {
        Self {
            identity: path.to_string(),
            output_path: path.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Fragment
// ---------------------------------------------------------------------------

/// One claimed entry handed to a coalescer.
pub struct Fragment<'a> {
    pub entry: &'a ArchiveEntry,
    pub source: &'a SourceArchive,
    /// The entry content; read it at most once.
    pub content: &'a mut dyn Read,
}

impl Fragment<'_> {
    /// Read the whole fragment as text, replacing invalid UTF-8.
    pub fn read_text(&mut self) -> std::io::Result<String> {
        let mut bytes = Vec::new();
        self.content.read_to_end(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

// ---------------------------------------------------------------------------
// Coalescer
// ---------------------------------------------------------------------------

/// Accumulates the fragments of one logical entry and writes the merged
/// result once.
pub trait Coalescer: Send {
    /// Take in one fragment.
    fn absorb(&mut self, fragment: Fragment<'_>) -> std::io::Result<()>;

    /// Write the merged content. Consumes the coalescer, so it runs once.
    fn emit(self: Box<Self>, sink: &mut dyn Write) -> std::io::Result<()>;
}

// ---------------------------------------------------------------------------
// MergeFilter
// ---------------------------------------------------------------------------

/// A pluggable merge policy.
///
/// For every entry the active filters are asked in order whether to omit it,
/// then whether to claim it for coalescing. The first filter to do either
/// settles the entry; an entry nobody settles is copied through under the
/// first-wins rule.
///
/// The trait is object-safe and `Send + Sync` so filters can be stored in a
/// `Vec<Box<dyn MergeFilter>>`.
pub trait MergeFilter: Send + Sync {
    /// Unique name (e.g. "services").
    fn name(&self) -> &str;

    /// Higher precedence filters are consulted first.
    fn precedence(&self) -> i32 {
        0
    }

    /// Critical filters are always active.
    fn is_critical(&self) -> bool {
        false
    }

    /// Whether the filter is active unless explicitly disabled.
    fn enabled_by_default(&self) -> bool {
        true
    }

    /// Whether this filter replaces `other` when both are active.
    fn supersedes(&self, _other: &dyn MergeFilter) -> bool {
        false
    }

    /// Drop the entry's path from the output for the whole merge.
    fn omit(&self, _entry: &ArchiveEntry, _source: &SourceArchive) -> bool {
        false
    }

    /// Claim the entry for coalescing.
    fn claim(&self, _entry: &ArchiveEntry, _source: &SourceArchive) -> Option<Claim> {
        None
    }

    /// Build the coalescer for a claim this filter made. Called once per
    /// distinct claim identity.
    fn coalescer(&self, _claim: &Claim) -> FilterResult<Box<dyn Coalescer>> {
        Err(FilterError::NotCoalescing(self.name().to_string()))
    }
}

impl std::fmt::Debug for dyn MergeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeFilter")
            .field("name", &self.name())
            .field("precedence", &self.precedence())
            .field("critical", &self.is_critical())
            .finish()
    }
}
