use std::path::PathBuf;

use jarmerge_filter::FilterSelection;
use serde::{Deserialize, Serialize};

use crate::error::{MergeError, MergeResult};

/// Options for one merge run.
///
/// Every field has a default, so a config file only needs to name what it
/// changes:
///
/// ```toml
/// output_path = "build/app.jar"
/// generate_index = true
///
/// [filters]
/// enable = ["discard-notices"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Where the merged archive is written.
    pub output_path: PathBuf,
    /// Deflate level 0-9; 0 stores entries uncompressed.
    pub compression_level: u32,
    /// Append a `META-INF/INDEX.LIST`.
    pub generate_index: bool,
    /// Stamp every entry with the fixed epoch for reproducible output.
    pub zero_timestamps: bool,
    /// `Main-Class` of the output; inherited from the inputs when unset.
    pub main_class: Option<String>,
    /// Filters switched on or off relative to their defaults.
    pub filters: FilterSelection,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::new(),
            compression_level: 6,
            generate_index: false,
            zero_timestamps: false,
            main_class: None,
            filters: FilterSelection::default(),
        }
    }
}

impl MergeConfig {
    /// Default options writing to `output_path`.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    /// Check the options before any input is touched.
    pub fn validate(&self) -> MergeResult<()> {
        if self.output_path.as_os_str().is_empty() {
            return Err(MergeError::config("no output path given"));
        }
        if self.output_path.file_name().is_none() {
            return Err(MergeError::config(format!(
                "output path {} does not name a file",
                self.output_path.display()
            )));
        }
        if self.compression_level > 9 {
            return Err(MergeError::config(format!(
                "compression level must be 0-9, got {}",
                self.compression_level
            )));
        }
        if let Some(main_class) = &self.main_class {
            if main_class.trim().is_empty() {
                return Err(MergeError::config("main class override is blank"));
            }
        }
        Ok(())
    }
}
