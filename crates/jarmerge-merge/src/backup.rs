use std::fs;
use std::path::{Path, PathBuf};

use jarmerge_types::SourceArchive;
use tracing::info;

use crate::error::{MergeError, MergeResult};

/// Prefix of the copy made of an input that is about to be overwritten.
pub const BACKUP_PREFIX: &str = "original-";

/// Inputs ready to be read, plus the backup made for an input that is also
/// the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedInputs {
    pub sources: Vec<SourceArchive>,
    pub backup: Option<PathBuf>,
}

/// Sibling path the backup of `path` is written to.
pub fn backup_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{BACKUP_PREFIX}{name}"))
}

/// Check that every input exists and, if one of them is `output`, copy it
/// aside so the merge reads the copy.
///
/// Fails before anything is written when an input is missing, or when the
/// backup already exists or cannot be made.
pub fn prepare_inputs(inputs: &[PathBuf], output: &Path) -> MergeResult<PreparedInputs> {
    for input in inputs {
        if !input.is_file() {
            return Err(MergeError::MissingInput(input.clone()));
        }
    }

    let output_real = fs::canonicalize(output).ok();
    let mut backup: Option<PathBuf> = None;
    let mut sources = Vec::with_capacity(inputs.len());

    for (ordinal, input) in inputs.iter().enumerate() {
        let source = SourceArchive::new(ordinal, input);
        let is_output = match &output_real {
            Some(real) => fs::canonicalize(input)? == *real,
            None => false,
        };
        if !is_output {
            sources.push(source);
            continue;
        }

        let copy = match &backup {
            Some(copy) => copy.clone(),
            None => {
                let copy = backup_path(output);
                if copy.exists() {
                    return Err(MergeError::config(format!(
                        "{} is also the output and its backup {} already exists",
                        input.display(),
                        copy.display()
                    )));
                }
                fs::copy(input, &copy).map_err(|e| {
                    MergeError::config(format!(
                        "cannot back up {} to {}: {e}",
                        input.display(),
                        copy.display()
                    ))
                })?;
                info!(input = %input.display(), backup = %copy.display(), "input backed up before overwrite");
                backup = Some(copy.clone());
                copy
            }
        };
        sources.push(source.read_from(copy));
    }

    Ok(PreparedInputs { sources, backup })
}
