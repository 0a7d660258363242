use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Normalized logical path of an entry inside an archive.
///
/// Paths are '/'-delimited and relative: backslashes become slashes, leading
/// slashes, empty segments and `.` segments are dropped. A trailing slash marks
/// a directory. `..` segments are rejected.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryPath(String);

impl EntryPath {
    /// Parse and normalize a raw entry name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TypeError> {
        let raw = raw.as_ref();
        let unified = raw.replace('\\', "/");
        let is_dir = unified.ends_with('/');

        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(TypeError::InvalidPath {
                        path: raw.to_string(),
                        reason: "parent segments are not allowed".into(),
                    })
                }
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            return Err(TypeError::EmptyPath);
        }

        let mut normalized = segments.join("/");
        if is_dir {
            normalized.push('/');
        }
        Ok(Self(normalized))
    }

    /// Parse a raw name as a directory path, adding the trailing slash.
    pub fn dir(raw: impl AsRef<str>) -> Result<Self, TypeError> {
        let path = Self::new(raw)?;
        if path.is_dir() {
            Ok(path)
        } else {
            Ok(Self(format!("{}/", path.0)))
        }
    }

    /// The normalized path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this path names a directory.
    pub fn is_dir(&self) -> bool {
        self.0.ends_with('/')
    }

    /// The path without its trailing directory slash.
    pub fn trimmed(&self) -> &str {
        self.0.strip_suffix('/').unwrap_or(&self.0)
    }

    /// Returns `true` if the path has no parent directory.
    pub fn is_top_level(&self) -> bool {
        !self.trimmed().contains('/')
    }

    /// Last path segment, without a trailing slash.
    pub fn file_name(&self) -> &str {
        let trimmed = self.trimmed();
        match trimmed.rfind('/') {
            Some(idx) => &trimmed[idx + 1..],
            None => trimmed,
        }
    }

    /// Every ancestor directory of this path, outermost first.
    ///
    /// `a/b/c.txt` yields `a/` and `a/b/`; a top-level path yields nothing.
    pub fn parent_dirs(&self) -> Vec<EntryPath> {
        let trimmed = self.trimmed();
        trimmed
            .match_indices('/')
            .map(|(idx, _)| Self(format!("{}/", &trimmed[..idx])))
            .collect()
    }
}

impl fmt::Debug for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryPath({:?})", self.0)
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntryPath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EntryPath {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntryPath> for String {
    fn from(path: EntryPath) -> Self {
        path.0
    }
}

impl AsRef<str> for EntryPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
