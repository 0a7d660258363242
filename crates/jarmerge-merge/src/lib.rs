//! Merge engine for jarmerge.
//!
//! Combines N input archives into one. The run has two phases:
//!
//! 1. **Dry run** ([`plan::plan`]): every entry of every input is shown to the
//!    filters; omissions, coalescing claims, first contributors and content
//!    digests are recorded in a [`MergePlan`]. Nothing is written.
//! 2. **Write** ([`write::execute`]): the plan is consumed and the inputs are
//!    walked again in the same order. Surviving entries are copied through,
//!    coalescers are emitted once each, later duplicates are dropped with a
//!    warning.
//!
//! Content conflicts (one path, different bytes in different inputs) never
//! fail a merge; they are logged and listed in the [`MergeReport`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use jarmerge_merge::{JarMerger, MergeConfig};
//!
//! let mut config = MergeConfig::new("build/app.jar");
//! config.zero_timestamps = true;
//! let merger = JarMerger::with_builtin_filters(config).unwrap();
//! let report = merger
//!     .merge(&[PathBuf::from("libs/core.jar"), PathBuf::from("libs/extra.jar")])
//!     .unwrap();
//! assert_eq!(report.counts.total, report.counts.accounted());
//! ```

pub mod backup;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod plan;
pub mod report;
pub mod write;

pub use backup::{backup_path, prepare_inputs, PreparedInputs, BACKUP_PREFIX};
pub use collector::{ConflictVariant, ContentConflict, HashCollector};
pub use config::MergeConfig;
pub use engine::JarMerger;
pub use error::{MergeError, MergeResult};
pub use manifest::{OutputManifest, CREATOR};
pub use plan::{CoalescerSlot, MergePlan};
pub use report::MergeReport;
pub use write::{EntryCounts, WriteOutcome};
