use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::collector::ContentConflict;
use crate::write::EntryCounts;

/// Summary of a finished merge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// The archive written.
    pub output: PathBuf,
    /// Inputs in merge order, as given.
    pub inputs: Vec<PathBuf>,
    /// Copy made of an input that was also the output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    /// Active filters in consultation order.
    pub filters: Vec<String>,
    /// `Main-Class` written to the output manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    pub counts: EntryCounts,
    /// Entries in the output, including manifest, directories and index.
    pub output_entries: usize,
    /// Paths listed in `INDEX.LIST`, when one was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<String>>,
    /// Paths whose inputs disagree on content.
    pub conflicts: Vec<ContentConflict>,
}

impl MergeReport {
    /// Returns `true` if no content conflict was found.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}
