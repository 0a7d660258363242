use std::collections::HashSet;

use jarmerge_types::{ArchiveEntry, SourceArchive};
use tracing::{debug, trace, trace_span, warn};

use crate::builtin;
use crate::config::FilterSelection;
use crate::error::{FilterError, FilterResult};
use crate::filter::{Claim, MergeFilter};

// ---------------------------------------------------------------------------
// FilterDecision
// ---------------------------------------------------------------------------

/// What the active filters decided for one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterDecision {
    /// Omit the path for the whole merge.
    Omit { filter: usize },
    /// Feed the entry to the coalescer identified by `claim`.
    Claim { filter: usize, claim: Claim },
    /// No filter acted; the entry is a pass-through candidate.
    Defer,
}

// ---------------------------------------------------------------------------
// FilterSet
// ---------------------------------------------------------------------------

/// The ordered set of active filters for one merge.
///
/// Built either from an already-resolved list ([`FilterSet::new`]) or by
/// resolving the available filters against a [`FilterSelection`]
/// ([`FilterSet::resolve`]).
pub struct FilterSet {
    filters: Vec<Box<dyn MergeFilter>>,
}

impl FilterSet {
    /// Use `filters` as given, in the given order.
    pub fn new(filters: Vec<Box<dyn MergeFilter>>) -> Self {
        Self { filters }
    }

    /// An empty set: every entry is a pass-through candidate.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Resolve the built-in filters against `selection`.
    pub fn builtin(selection: &FilterSelection) -> FilterResult<Self> {
        Self::resolve(builtin::all(), selection)
    }

    /// Pick the active filters out of `available`.
    ///
    /// 1. A filter is active if it is critical, explicitly enabled, or
    ///    enabled by default and not explicitly disabled.
    /// 2. Every active filter superseded by another active filter is dropped.
    ///    Supersession is evaluated against the set from step 1, so the result
    ///    does not depend on the order filters were registered in.
    /// 3. The survivors are ordered by descending precedence; ties keep
    ///    registration order.
    pub fn resolve(
        available: Vec<Box<dyn MergeFilter>>,
        selection: &FilterSelection,
    ) -> FilterResult<Self> {
        let mut names = HashSet::new();
        for filter in &available {
            if !names.insert(filter.name().to_string()) {
                return Err(FilterError::config(format!(
                    "filter '{}' is registered twice",
                    filter.name()
                )));
            }
        }
        for name in selection.enable.iter().chain(&selection.disable) {
            if !names.contains(name) {
                return Err(FilterError::UnknownFilter(name.clone()));
            }
        }
        for name in &selection.enable {
            if selection.is_disabled(name) {
                return Err(FilterError::config(format!(
                    "filter '{name}' is both enabled and disabled"
                )));
            }
        }
        if let Some(critical) = available
            .iter()
            .find(|f| f.is_critical() && selection.is_disabled(f.name()))
        {
            return Err(FilterError::CriticalFilter(critical.name().to_string()));
        }

        let active: Vec<Box<dyn MergeFilter>> = available
            .into_iter()
            .filter(|f| {
                f.is_critical()
                    || selection.is_enabled(f.name())
                    || (f.enabled_by_default() && !selection.is_disabled(f.name()))
            })
            .collect();

        let superseded: Vec<bool> = active
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                let by = active
                    .iter()
                    .enumerate()
                    .find(|(j, other)| *j != i && other.supersedes(&**candidate));
                match by {
                    Some((_, other)) if candidate.is_critical() => {
                        warn!(
                            filter = candidate.name(),
                            by = other.name(),
                            "critical filter cannot be superseded; keeping it"
                        );
                        false
                    }
                    Some((_, other)) => {
                        debug!(filter = candidate.name(), by = other.name(), "filter superseded");
                        true
                    }
                    None => false,
                }
            })
            .collect();

        let mut filters: Vec<Box<dyn MergeFilter>> = active
            .into_iter()
            .zip(superseded)
            .filter_map(|(f, dropped)| (!dropped).then_some(f))
            .collect();
        filters.sort_by_key(|f| std::cmp::Reverse(f.precedence()));

        debug!(
            filters = ?filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            "active merge filters"
        );
        Ok(Self { filters })
    }

    /// Number of active filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Active filter at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn MergeFilter> {
        self.filters.get(index).map(|f| f.as_ref())
    }

    /// Names of the active filters in consultation order.
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn MergeFilter> {
        self.filters.iter().map(|f| f.as_ref())
    }

    /// Ask the filters, in order, what to do with `entry`.
    ///
    /// Each filter is asked to omit, then to claim; the first one that does
    /// either settles the entry and later filters are not consulted.
    pub fn evaluate(&self, entry: &ArchiveEntry, source: &SourceArchive) -> FilterDecision {
        for (index, filter) in self.filters.iter().enumerate() {
            let _span = trace_span!("filter", name = filter.name()).entered();
            if filter.omit(entry, source) {
                trace!(path = %entry.path, archive = %source, "omitted");
                return FilterDecision::Omit { filter: index };
            }
            if let Some(claim) = filter.claim(entry, source) {
                trace!(path = %entry.path, archive = %source, identity = %claim.identity, "claimed");
                return FilterDecision::Claim {
                    filter: index,
                    claim,
                };
            }
        }
        FilterDecision::Defer
    }
}

impl std::fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.filters.iter().map(|f| f.name())).finish()
    }
}

#[cfg(test)]
mod tests {
    use jarmerge_types::{EntryPath, EntryTimes};

    use super::*;

    struct TestFilter {
        name: &'static str,
        precedence: i32,
        critical: bool,
        default_on: bool,
        supersedes: Option<&'static str>,
        omit_prefix: Option<&'static str>,
        claim_prefix: Option<&'static str>,
    }

    impl TestFilter {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                precedence: 0,
                critical: false,
                default_on: true,
                supersedes: None,
                omit_prefix: None,
                claim_prefix: None,
            }
        }
    }

    impl MergeFilter for TestFilter {
        fn name(&self) -> &str {
            self.name
        }
        fn precedence(&self) -> i32 {
            self.precedence
        }
        fn is_critical(&self) -> bool {
            self.critical
        }
        fn enabled_by_default(&self) -> bool {
            self.default_on
        }
        fn supersedes(&self, other: &dyn MergeFilter) -> bool {
            self.supersedes == Some(other.name())
        }
        fn omit(&self, entry: &ArchiveEntry, _source: &SourceArchive) -> bool {
            self.omit_prefix
                .is_some_and(|p| entry.path.as_str().starts_with(p))
        }
        fn claim(&self, entry: &ArchiveEntry, _source: &SourceArchive) -> Option<Claim> {
            self.claim_prefix
                .filter(|p| entry.path.as_str().starts_with(p))
                .map(|_| Claim::same_path(&entry.path))
        }
    }

    fn entry(path: &str) -> ArchiveEntry {
        ArchiveEntry::new(EntryPath::new(path).unwrap(), 1, EntryTimes::none())
    }

    fn boxed(filters: Vec<TestFilter>) -> Vec<Box<dyn MergeFilter>> {
        filters
            .into_iter()
            .map(|f| Box::new(f) as Box<dyn MergeFilter>)
            .collect()
    }

    #[test]
    fn defaults_and_explicit_selection() {
        let mut off = TestFilter::new("off");
        off.default_on = false;
        let available = boxed(vec![TestFilter::new("on"), off, TestFilter::new("other")]);

        let set = FilterSet::resolve(
            available,
            &FilterSelection::defaults().enabling("off").disabling("other"),
        )
        .unwrap();
        assert_eq!(set.names(), vec!["on", "off"]);
    }

    #[test]
    fn ordered_by_descending_precedence_stable() {
        let mut high = TestFilter::new("high");
        high.precedence = 10;
        let available = boxed(vec![TestFilter::new("a"), high, TestFilter::new("b")]);
        let set = FilterSet::resolve(available, &FilterSelection::defaults()).unwrap();
        assert_eq!(set.names(), vec!["high", "a", "b"]);
    }

    #[test]
    fn unknown_names_rejected() {
        let err = FilterSet::resolve(
            boxed(vec![TestFilter::new("a")]),
            &FilterSelection::defaults().disabling("nope"),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::UnknownFilter(n) if n == "nope"));
    }

    #[test]
    fn critical_cannot_be_disabled() {
        let mut critical = TestFilter::new("crit");
        critical.critical = true;
        let err = FilterSet::resolve(
            boxed(vec![critical]),
            &FilterSelection::defaults().disabling("crit"),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::CriticalFilter(n) if n == "crit"));
    }

    #[test]
    fn critical_active_even_if_off_by_default() {
        let mut critical = TestFilter::new("crit");
        critical.critical = true;
        critical.default_on = false;
        let set = FilterSet::resolve(boxed(vec![critical]), &FilterSelection::defaults()).unwrap();
        assert_eq!(set.names(), vec!["crit"]);
    }

    #[test]
    fn enabled_and_disabled_is_config_error() {
        let err = FilterSet::resolve(
            boxed(vec![TestFilter::new("a")]),
            &FilterSelection::defaults().enabling("a").disabling("a"),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::Config(_)));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let err = FilterSet::resolve(
            boxed(vec![TestFilter::new("a"), TestFilter::new("a")]),
            &FilterSelection::defaults(),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::Config(_)));
    }

    #[test]
    fn superseded_filter_dropped() {
        let mut replacement = TestFilter::new("replacement");
        replacement.supersedes = Some("original");
        let available = boxed(vec![TestFilter::new("original"), replacement]);
        let set = FilterSet::resolve(available, &FilterSelection::defaults()).unwrap();
        assert_eq!(set.names(), vec!["replacement"]);
    }

    #[test]
    fn inactive_filter_supersedes_nothing() {
        let mut replacement = TestFilter::new("replacement");
        replacement.supersedes = Some("original");
        replacement.default_on = false;
        let available = boxed(vec![TestFilter::new("original"), replacement]);
        let set = FilterSet::resolve(available, &FilterSelection::defaults()).unwrap();
        assert_eq!(set.names(), vec!["original"]);
    }

    #[test]
    fn supersession_independent_of_order() {
        let make = |first_is_replacement: bool| {
            let mut replacement = TestFilter::new("replacement");
            replacement.supersedes = Some("original");
            let original = TestFilter::new("original");
            let filters = if first_is_replacement {
                vec![replacement, original]
            } else {
                vec![original, replacement]
            };
            FilterSet::resolve(boxed(filters), &FilterSelection::defaults())
                .unwrap()
                .names()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        };
        assert_eq!(make(true), make(false));
    }

    #[test]
    fn evaluate_short_circuits_in_order() {
        let mut omitter = TestFilter::new("omitter");
        omitter.omit_prefix = Some("META-INF/x");
        let mut claimer = TestFilter::new("claimer");
        claimer.claim_prefix = Some("META-INF/");
        let set = FilterSet::new(boxed(vec![omitter, claimer]));
        let src = SourceArchive::new(0, "a.jar");

        assert_eq!(
            set.evaluate(&entry("META-INF/x.SF"), &src),
            FilterDecision::Omit { filter: 0 }
        );
        assert_eq!(
            set.evaluate(&entry("META-INF/services/s"), &src),
            FilterDecision::Claim {
                filter: 1,
                claim: Claim::same_path(&EntryPath::new("META-INF/services/s").unwrap()),
            }
        );
        assert_eq!(set.evaluate(&entry("com/A.class"), &src), FilterDecision::Defer);
    }

    #[test]
    fn claiming_filter_without_coalescer_errors() {
        let filter = TestFilter::new("lazy");
        let claim = Claim::same_path(&EntryPath::new("x").unwrap());
        assert!(matches!(
            filter.coalescer(&claim),
            Err(FilterError::NotCoalescing(n)) if n == "lazy"
        ));
    }

    #[test]
    fn empty_set_defers_everything() {
        let set = FilterSet::empty();
        assert!(set.is_empty());
        assert_eq!(
            set.evaluate(&entry("a"), &SourceArchive::new(0, "a.jar")),
            FilterDecision::Defer
        );
    }
}
