use jarmerge_types::{ArchiveEntry, SourceArchive};

use super::meta_inf_child;
use crate::filter::MergeFilter;

const SIGNATURE_SUFFIXES: [&str; 4] = [".SF", ".DSA", ".RSA", ".EC"];

/// Drops the signature files of the inputs.
///
/// Signatures cover the original archive's contents and are invalid in the
/// merged output, where they would make the whole archive fail verification.
pub struct SignaturesFilter;

impl SignaturesFilter {
    /// Whether a `META-INF/` file name is signature material.
    pub fn is_signature(name: &str) -> bool {
        let upper = name.to_ascii_uppercase();
        upper.starts_with("SIG-") || SIGNATURE_SUFFIXES.iter().any(|s| upper.ends_with(s))
    }
}

impl MergeFilter for SignaturesFilter {
    fn name(&self) -> &str {
        "signatures"
    }

    fn precedence(&self) -> i32 {
        100
    }

    fn is_critical(&self) -> bool {
        true
    }

    fn omit(&self, entry: &ArchiveEntry, _source: &SourceArchive) -> bool {
        meta_inf_child(&entry.path).is_some_and(Self::is_signature)
    }
}
