use std::collections::HashSet;
use std::io::Write;

use jarmerge_types::{ArchiveEntry, EntryPath, SourceArchive};

use super::meta_inf_child;
use crate::error::FilterResult;
use crate::filter::{Claim, Coalescer, Fragment, MergeFilter};

fn is_notice(path: &EntryPath) -> bool {
    meta_inf_child(path).is_some_and(|name| {
        let upper = name.to_ascii_uppercase();
        upper.starts_with("LICENSE") || upper.starts_with("NOTICE")
    })
}

/// Concatenates the distinct `META-INF/LICENSE*` and `META-INF/NOTICE*`
/// texts of all inputs.
pub struct NoticesFilter;

impl MergeFilter for NoticesFilter {
    fn name(&self) -> &str {
        "notices"
    }

    fn precedence(&self) -> i32 {
        10
    }

    fn claim(&self, entry: &ArchiveEntry, _source: &SourceArchive) -> Option<Claim> {
        is_notice(&entry.path).then(|| Claim::same_path(&entry.path))
    }

    fn coalescer(&self, _claim: &Claim) -> FilterResult<Box<dyn Coalescer>> {
        Ok(Box::<NoticeText>::default())
    }
}

/// Drops license and notice files instead of merging them. Off by default.
pub struct DiscardNoticesFilter;

impl MergeFilter for DiscardNoticesFilter {
    fn name(&self) -> &str {
        "discard-notices"
    }

    fn precedence(&self) -> i32 {
        10
    }

    fn enabled_by_default(&self) -> bool {
        false
    }

    fn supersedes(&self, other: &dyn MergeFilter) -> bool {
        other.name() == "notices"
    }

    fn omit(&self, entry: &ArchiveEntry, _source: &SourceArchive) -> bool {
        is_notice(&entry.path)
    }
}

/// Distinct notice texts in first-seen order.
#[derive(Debug, Default)]
pub struct NoticeText {
    seen: HashSet<String>,
    parts: Vec<String>,
}

impl Coalescer for NoticeText {
    fn absorb(&mut self, mut fragment: Fragment<'_>) -> std::io::Result<()> {
        let text = fragment.read_text()?;
        let text = text.trim();
        if !text.is_empty() && self.seen.insert(text.to_string()) {
            self.parts.push(text.to_string());
        }
        Ok(())
    }

    fn emit(self: Box<Self>, sink: &mut dyn Write) -> std::io::Result<()> {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                sink.write_all(b"\n")?;
            }
            sink.write_all(part.as_bytes())?;
            sink.write_all(b"\n")?;
        }
        Ok(())
    }
}
