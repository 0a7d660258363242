//! Merge policy registry for jarmerge.
//!
//! Every entry of every input archive is shown to the active filters before
//! the engine decides what to do with it. A filter can omit the entry's path
//! for the whole merge, claim the entry for a coalescer that merges all
//! same-identity entries into one, or defer, leaving the entry to the
//! first-wins pass-through rule.
//!
//! # Quick Start
//!
//! ```rust
//! use jarmerge_filter::{FilterDecision, FilterSelection, FilterSet};
//! use jarmerge_types::{ArchiveEntry, EntryPath, EntryTimes, SourceArchive};
//!
//! let filters = FilterSet::builtin(&FilterSelection::defaults()).unwrap();
//! let entry = ArchiveEntry::new(
//!     EntryPath::new("META-INF/services/com.x.Spi").unwrap(),
//!     12,
//!     EntryTimes::none(),
//! );
//! let decision = filters.evaluate(&entry, &SourceArchive::new(0, "a.jar"));
//! assert!(matches!(decision, FilterDecision::Claim { .. }));
//! ```

pub mod builtin;
pub mod config;
pub mod error;
pub mod filter;
pub mod registry;

// Re-exports for convenience.
pub use config::FilterSelection;
pub use error::{FilterError, FilterResult};
pub use filter::{Claim, Coalescer, Fragment, MergeFilter};
pub use registry::{FilterDecision, FilterSet};

#[cfg(test)]
mod tests {
    use jarmerge_types::{ArchiveEntry, EntryPath, EntryTimes, SourceArchive};

    use super::*;

    fn decide(filters: &FilterSet, path: &str) -> FilterDecision {
        let entry = ArchiveEntry::new(EntryPath::new(path).unwrap(), 1, EntryTimes::none());
        filters.evaluate(&entry, &SourceArchive::new(0, "a.jar"))
    }

    fn filter_name(filters: &FilterSet, decision: &FilterDecision) -> Option<String> {
        let index = match decision {
            FilterDecision::Omit { filter } | FilterDecision::Claim { filter, .. } => *filter,
            FilterDecision::Defer => return None,
        };
        filters.get(index).map(|f| f.name().to_string())
    }

    // -----------------------------------------------------------------------
    // 1. Default built-in set and its order
    // -----------------------------------------------------------------------
    #[test]
    fn default_builtin_order() {
        let filters = FilterSet::builtin(&FilterSelection::defaults()).unwrap();
        assert_eq!(
            filters.names(),
            vec!["signatures", "index-list", "services", "spring-handlers", "notices"]
        );
    }

    // -----------------------------------------------------------------------
    // 2. Enabling discard-notices drops notices
    // -----------------------------------------------------------------------
    #[test]
    fn discard_notices_supersedes_notices() {
        let filters =
            FilterSet::builtin(&FilterSelection::defaults().enabling("discard-notices")).unwrap();
        assert!(!filters.names().contains(&"notices"));
        let decision = decide(&filters, "META-INF/LICENSE");
        assert!(matches!(decision, FilterDecision::Omit { .. }));
        assert_eq!(filter_name(&filters, &decision).as_deref(), Some("discard-notices"));
    }

    // -----------------------------------------------------------------------
    // 3. Critical built-ins refuse to be disabled
    // -----------------------------------------------------------------------
    #[test]
    fn signatures_cannot_be_disabled() {
        let err = FilterSet::builtin(&FilterSelection::defaults().disabling("signatures"))
            .unwrap_err();
        assert!(matches!(err, FilterError::CriticalFilter(_)));
    }

    // -----------------------------------------------------------------------
    // 4. Decisions for typical JAR resources
    // -----------------------------------------------------------------------
    #[test]
    fn typical_resources() {
        let filters = FilterSet::builtin(&FilterSelection::defaults()).unwrap();
        let cases = [
            ("META-INF/CERT.SF", Some("signatures")),
            ("META-INF/INDEX.LIST", Some("index-list")),
            ("META-INF/services/java.sql.Driver", Some("services")),
            ("META-INF/spring.handlers", Some("spring-handlers")),
            ("META-INF/NOTICE.txt", Some("notices")),
            ("com/x/Y.class", None),
            ("META-INF/MANIFEST.MF", None),
        ];
        for (path, expected) in cases {
            let decision = decide(&filters, path);
            assert_eq!(filter_name(&filters, &decision).as_deref(), expected, "{path}");
        }
    }

    // -----------------------------------------------------------------------
    // 5. Disabling services leaves service files as pass-through
    // -----------------------------------------------------------------------
    #[test]
    fn disabled_services_defer() {
        let filters =
            FilterSet::builtin(&FilterSelection::defaults().disabling("services")).unwrap();
        assert_eq!(decide(&filters, "META-INF/services/x.Spi"), FilterDecision::Defer);
    }
}
