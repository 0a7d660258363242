use std::path::PathBuf;

use jarmerge_filter::FilterSet;
use tracing::{info, warn};

use crate::backup::prepare_inputs;
use crate::config::MergeConfig;
use crate::error::{MergeError, MergeResult};
use crate::plan::plan;
use crate::report::MergeReport;
use crate::write::execute;

/// Merges input archives into one.
///
/// Each [`JarMerger::merge`] call runs the dry-run phase to completion and
/// then the write phase; an error in either aborts the run and leaves any
/// existing output untouched.
#[derive(Debug)]
pub struct JarMerger {
    config: MergeConfig,
    filters: FilterSet,
}

impl JarMerger {
    /// Create a merger with an already-resolved filter set.
    pub fn new(config: MergeConfig, filters: FilterSet) -> Self {
        Self { config, filters }
    }

    /// Create a merger using the built-in filters selected by `config`.
    pub fn with_builtin_filters(config: MergeConfig) -> MergeResult<Self> {
        let filters = FilterSet::builtin(&config.filters)?;
        Ok(Self::new(config, filters))
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Merge `inputs`, earliest first, into the configured output.
    pub fn merge(&self, inputs: &[PathBuf]) -> MergeResult<MergeReport> {
        self.config.validate()?;
        if inputs.is_empty() {
            return Err(MergeError::config("no input archives given"));
        }

        let prepared = prepare_inputs(inputs, &self.config.output_path)?;
        info!(
            inputs = prepared.sources.len(),
            output = %self.config.output_path.display(),
            filters = ?self.filters.names(),
            "merging archives"
        );

        let plan = plan(&prepared.sources, &self.filters, &self.config)?;
        let filters = plan.filter_names().to_vec();
        let conflicts = plan.collector().conflicts(&prepared.sources);
        let outcome = execute(plan, &prepared.sources, &self.config)?;

        for conflict in &conflicts {
            warn!(conflict = %conflict.describe(), "inputs disagree on content");
        }
        info!(
            output = %outcome.archive.path.display(),
            entries = outcome.archive.entry_count,
            written = outcome.counts.written,
            coalesced = outcome.counts.coalesced,
            skipped = outcome.counts.skipped,
            duplicates = outcome.counts.duplicates,
            conflicts = conflicts.len(),
            "merge complete"
        );

        Ok(MergeReport {
            output: outcome.archive.path,
            inputs: inputs.to_vec(),
            backup: prepared.backup,
            filters,
            main_class: outcome.main_class,
            counts: outcome.counts,
            output_entries: outcome.archive.entry_count,
            index: outcome.archive.index,
            conflicts,
        })
    }
}
