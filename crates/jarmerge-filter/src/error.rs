use std::io;

use jarmerge_types::EntryPath;

/// Errors raised while resolving or running merge filters.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// A filter name in the selection does not match any available filter.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// A critical filter was asked to be disabled.
    #[error("filter '{0}' is critical and cannot be disabled")]
    CriticalFilter(String),

    /// The filter configuration is inconsistent.
    #[error("filter configuration error: {0}")]
    Config(String),

    /// A filter claimed an entry but cannot build a coalescer for it.
    #[error("filter '{0}' claimed an entry but does not coalesce")]
    NotCoalescing(String),

    /// A coalescer failed to absorb a fragment.
    #[error("filter '{filter}' failed to absorb {path}: {source}")]
    Absorb {
        filter: String,
        path: EntryPath,
        #[source]
        source: io::Error,
    },

    /// A coalescer failed to emit its merged content.
    #[error("filter '{filter}' failed to emit {path}: {source}")]
    Emit {
        filter: String,
        path: EntryPath,
        #[source]
        source: io::Error,
    },
}

impl FilterError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result alias for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;
