use std::collections::HashSet;
use std::io::Write;

use jarmerge_types::{ArchiveEntry, SourceArchive};
use tracing::trace;

use super::under_meta_inf;
use crate::error::FilterResult;
use crate::filter::{Claim, Coalescer, Fragment, MergeFilter};

/// Merges `META-INF/services/<interface>` provider registrations.
///
/// Each archive lists the implementations it provides; the merged file lists
/// every provider once, in the order first seen.
pub struct ServicesFilter;

impl MergeFilter for ServicesFilter {
    fn name(&self) -> &str {
        "services"
    }

    fn precedence(&self) -> i32 {
        50
    }

    fn claim(&self, entry: &ArchiveEntry, _source: &SourceArchive) -> Option<Claim> {
        let rest = under_meta_inf(&entry.path)?;
        let service = rest.strip_prefix("services/")?;
        if service.is_empty() || service.contains('/') {
            return None;
        }
        Some(Claim::same_path(&entry.path))
    }

    fn coalescer(&self, _claim: &Claim) -> FilterResult<Box<dyn Coalescer>> {
        Ok(Box::<ServiceLines>::default())
    }
}

/// Ordered, de-duplicated union of provider lines.
#[derive(Debug, Default)]
pub struct ServiceLines {
    seen: HashSet<String>,
    lines: Vec<String>,
}

impl ServiceLines {
    /// Add the providers listed in `text`. Comments after `#` and blank
    /// lines are dropped.
    pub fn add_text(&mut self, text: &str) {
        for raw in text.lines() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            if self.seen.insert(line.to_string()) {
                self.lines.push(line.to_string());
            }
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Coalescer for ServiceLines {
    fn absorb(&mut self, mut fragment: Fragment<'_>) -> std::io::Result<()> {
        let text = fragment.read_text()?;
        let before = self.lines.len();
        self.add_text(&text);
        trace!(
            path = %fragment.entry.path,
            archive = %fragment.source,
            added = self.lines.len() - before,
            "service providers absorbed"
        );
        Ok(())
    }

    fn emit(self: Box<Self>, sink: &mut dyn Write) -> std::io::Result<()> {
        for line in &self.lines {
            sink.write_all(line.as_bytes())?;
            sink.write_all(b"\n")?;
        }
        Ok(())
    }
}
