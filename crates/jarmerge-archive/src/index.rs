use std::collections::HashSet;

use jarmerge_types::EntryPath;

/// Path of the index entry inside a JAR.
pub const INDEX_PATH: &str = "META-INF/INDEX.LIST";

/// Header line of the index.
pub const INDEX_HEADER: &str = "JarIndex-Version: 1.0";

/// Records what the index must list while entries are being written.
///
/// Every directory (with its trailing slash removed) and every top-level
/// file is listed once, in the order it was first written.
#[derive(Clone, Debug, Default)]
pub struct IndexBuilder {
    seen: HashSet<String>,
    paths: Vec<String>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note a written entry. Returns `true` if it was added to the index.
    pub fn record(&mut self, path: &EntryPath) -> bool {
        if !(path.is_dir() || path.is_top_level()) {
            return false;
        }
        let listed = path.trimmed().to_string();
        if self.seen.insert(listed.clone()) {
            self.paths.push(listed);
            true
        } else {
            false
        }
    }

    /// Listed paths in insertion order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Render the index body for an archive named `archive_name`.
    pub fn render(&self, archive_name: &str) -> String {
        let mut out = String::with_capacity(64 + self.paths.iter().map(|p| p.len() + 1).sum::<usize>());
        out.push_str(INDEX_HEADER);
        out.push_str("\n\n");
        out.push_str(archive_name);
        out.push('\n');
        for path in &self.paths {
            out.push_str(path);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> EntryPath {
        EntryPath::new(raw).unwrap()
    }

    #[test]
    fn records_directories_and_top_level_files() {
        let mut index = IndexBuilder::new();
        assert!(index.record(&p("com/")));
        assert!(index.record(&p("com/x/")));
        assert!(!index.record(&p("com/x/Y.class")));
        assert!(index.record(&p("LICENSE")));
        assert!(!index.record(&p("com/")));
        assert_eq!(index.paths(), &["com", "com/x", "LICENSE"]);
    }

    #[test]
    fn render_format() {
        let mut index = IndexBuilder::new();
        index.record(&p("com/"));
        index.record(&p("App.class"));
        assert_eq!(
            index.render("app.jar"),
            "JarIndex-Version: 1.0\n\napp.jar\ncom\nApp.class\n"
        );
    }

    #[test]
    fn empty_index_still_names_archive() {
        assert_eq!(IndexBuilder::new().render("a.jar"), "JarIndex-Version: 1.0\n\na.jar\n");
    }
}
