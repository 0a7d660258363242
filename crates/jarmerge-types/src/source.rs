use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One input archive and its position in the caller-supplied merge order.
///
/// `location` is the file actually read. It differs from `display` when the
/// input had to be copied aside because it is also the output path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceArchive {
    /// Zero-based position in merge order; lower wins on duplicates.
    pub ordinal: usize,
    /// Path the archive is read from.
    pub location: PathBuf,
    /// Path as supplied by the caller, used in diagnostics.
    pub display: PathBuf,
}

impl SourceArchive {
    /// Create a source that is read from the path it was given as.
    pub fn new(ordinal: usize, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            ordinal,
            location: path.clone(),
            display: path,
        }
    }

    /// Redirect reads to another file while keeping the display path.
    pub fn read_from(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = location.into();
        self
    }

    /// Bare file name of the display path.
    pub fn file_name(&self) -> String {
        self.display
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display.display().to_string())
    }

    /// The display path.
    pub fn display_path(&self) -> &Path {
        &self.display
    }
}

impl fmt::Display for SourceArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display.display())
    }
}
