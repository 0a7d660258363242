//! Built-in merge filters.
//!
//! These cover the resources every merged JAR has to care about: signature
//! files that no longer match, the old index, service registrations, Spring
//! namespace handlers and license notices.

pub mod index_list;
pub mod notices;
pub mod services;
pub mod signatures;
pub mod spring;

pub use index_list::IndexListFilter;
pub use notices::{DiscardNoticesFilter, NoticesFilter};
pub use services::ServicesFilter;
pub use signatures::SignaturesFilter;
pub use spring::SpringHandlersFilter;

use jarmerge_types::EntryPath;

use crate::filter::MergeFilter;

/// Every built-in filter, in registration order.
pub fn all() -> Vec<Box<dyn MergeFilter>> {
    vec![
        Box::new(SignaturesFilter),
        Box::new(IndexListFilter),
        Box::new(ServicesFilter),
        Box::new(SpringHandlersFilter),
        Box::new(NoticesFilter),
        Box::new(DiscardNoticesFilter),
    ]
}

const META_INF: &str = "META-INF/";

/// The remainder of `path` below `META-INF/`, matched case-insensitively.
/// Directories never match.
pub(crate) fn under_meta_inf(path: &EntryPath) -> Option<&str> {
    if path.is_dir() {
        return None;
    }
    let raw = path.as_str();
    let prefix = raw.get(..META_INF.len())?;
    prefix
        .eq_ignore_ascii_case(META_INF)
        .then(|| &raw[META_INF.len()..])
}

/// File name of a direct child of `META-INF/`.
pub(crate) fn meta_inf_child(path: &EntryPath) -> Option<&str> {
    under_meta_inf(path).filter(|rest| !rest.contains('/') && !rest.is_empty())
}
