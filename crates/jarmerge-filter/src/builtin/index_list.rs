use jarmerge_types::{ArchiveEntry, SourceArchive};

use super::meta_inf_child;
use crate::filter::MergeFilter;

/// Drops the inputs' `META-INF/INDEX.LIST`; a stale index would point the
/// class loader at the wrong archive. The writer synthesises a fresh one
/// when asked to.
pub struct IndexListFilter;

impl MergeFilter for IndexListFilter {
    fn name(&self) -> &str {
        "index-list"
    }

    fn precedence(&self) -> i32 {
        100
    }

    fn is_critical(&self) -> bool {
        true
    }

    fn omit(&self, entry: &ArchiveEntry, _source: &SourceArchive) -> bool {
        meta_inf_child(&entry.path).is_some_and(|name| name.eq_ignore_ascii_case("INDEX.LIST"))
    }
}
