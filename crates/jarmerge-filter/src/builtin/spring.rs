use std::collections::HashMap;
use std::io::Write;

use jarmerge_types::{ArchiveEntry, SourceArchive};
use tracing::warn;

use super::meta_inf_child;
use crate::error::FilterResult;
use crate::filter::{Claim, Coalescer, Fragment, MergeFilter};

const SPRING_FILES: [&str; 3] = ["spring.handlers", "spring.schemas", "spring.tooling"];

/// Merges Spring's namespace handler and schema mappings.
///
/// The files are Java properties; the merged file holds every key once and
/// the first archive to define a key wins.
pub struct SpringHandlersFilter;

impl MergeFilter for SpringHandlersFilter {
    fn name(&self) -> &str {
        "spring-handlers"
    }

    fn precedence(&self) -> i32 {
        40
    }

    fn claim(&self, entry: &ArchiveEntry, _source: &SourceArchive) -> Option<Claim> {
        let name = meta_inf_child(&entry.path)?;
        SPRING_FILES
            .contains(&name)
            .then(|| Claim::same_path(&entry.path))
    }

    fn coalescer(&self, _claim: &Claim) -> FilterResult<Box<dyn Coalescer>> {
        Ok(Box::<PropertyUnion>::default())
    }
}

/// One `key=value` pair, kept in its escaped source form.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Property {
    raw_key: String,
    raw_value: String,
    origin: String,
}

/// Union of properties files where the first definition of a key wins.
#[derive(Debug, Default)]
pub struct PropertyUnion {
    index: HashMap<String, usize>,
    properties: Vec<Property>,
}

impl PropertyUnion {
    /// Add the properties in `text`, attributing them to `origin`.
    pub fn add_text(&mut self, text: &str, origin: &str) {
        for line in logical_lines(text) {
            let Some((raw_key, raw_value)) = split_property(&line) else {
                continue;
            };
            let key = unescape(raw_key);
            match self.index.get(&key) {
                Some(&at) => {
                    let kept = &self.properties[at];
                    if unescape(&kept.raw_value) != unescape(raw_value) {
                        warn!(
                            key = %key,
                            kept = %kept.origin,
                            dropped = origin,
                            "conflicting property definition; keeping the first"
                        );
                    }
                }
                None => {
                    self.index.insert(key, self.properties.len());
                    self.properties.push(Property {
                        raw_key: raw_key.to_string(),
                        raw_value: raw_value.to_string(),
                        origin: origin.to_string(),
                    });
                }
            }
        }
    }

    /// Unescaped `(key, value)` pairs in first-seen order.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.properties
            .iter()
            .map(|p| (unescape(&p.raw_key), unescape(&p.raw_value)))
            .collect()
    }
}

impl Coalescer for PropertyUnion {
    fn absorb(&mut self, mut fragment: Fragment<'_>) -> std::io::Result<()> {
        let text = fragment.read_text()?;
        let origin = fragment.source.file_name();
        self.add_text(&text, &origin);
        Ok(())
    }

    fn emit(self: Box<Self>, sink: &mut dyn Write) -> std::io::Result<()> {
        for property in &self.properties {
            writeln!(sink, "{}={}", property.raw_key, property.raw_value)?;
        }
        Ok(())
    }
}

/// Join continuation lines and drop blanks and comments.
fn logical_lines(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending: Option<String> = None;
    for raw in text.lines() {
        let line = raw.trim_start();
        let mut current = match pending.take() {
            Some(prefix) => prefix + line,
            None => {
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                line.to_string()
            }
        };
        if ends_with_continuation(&current) {
            current.pop();
            pending = Some(current);
        } else {
            out.push(current);
        }
    }
    if let Some(rest) = pending {
        out.push(rest);
    }
    out
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split at the first unescaped `=`, `:` or whitespace.
fn split_property(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return Some((&line[..i], line[i + 1..].trim())),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return Some((&line[..i], rest.trim()));
            }
            _ => {}
        }
    }
    (!line.is_empty()).then_some((line, ""))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use jarmerge_types::{EntryPath, EntryTimes};

    use super::*;

    #[test]
    fn claims_spring_files() {
        let src = SourceArchive::new(0, "a.jar");
        let entry = |p: &str| ArchiveEntry::new(EntryPath::new(p).unwrap(), 1, EntryTimes::none());
        for name in SPRING_FILES {
            let path = format!("META-INF/{name}");
            assert!(SpringHandlersFilter.claim(&entry(&path), &src).is_some());
        }
        assert!(SpringHandlersFilter.claim(&entry("META-INF/spring.factories"), &src).is_none());
        assert!(SpringHandlersFilter.claim(&entry("spring.handlers"), &src).is_none());
    }

    #[test]
    fn first_definition_wins() {
        let mut union = PropertyUnion::default();
        union.add_text(
            "http\\://www.example.org/schema/a=org.a.Handler\nshared=first\n",
            "a.jar",
        );
        union.add_text("shared=second\nhttp\\://www.example.org/schema/b=org.b.Handler\n", "b.jar");
        assert_eq!(
            union.entries(),
            vec![
                ("http://www.example.org/schema/a".to_string(), "org.a.Handler".to_string()),
                ("shared".to_string(), "first".to_string()),
                ("http://www.example.org/schema/b".to_string(), "org.b.Handler".to_string()),
            ]
        );
    }

    #[test]
    fn comments_continuations_and_separators() {
        let mut union = PropertyUnion::default();
        union.add_text(
            "# comment\n! also comment\n\nkey1 = one\nkey2: two\nkey3 three\nlong=a\\\n    b\n",
            "a.jar",
        );
        assert_eq!(
            union.entries(),
            vec![
                ("key1".to_string(), "one".to_string()),
                ("key2".to_string(), "two".to_string()),
                ("key3".to_string(), "three".to_string()),
                ("long".to_string(), "ab".to_string()),
            ]
        );
    }

    #[test]
    fn emit_keeps_escaped_keys() {
        let src = SourceArchive::new(0, "a.jar");
        let e = ArchiveEntry::new(EntryPath::new("META-INF/spring.schemas").unwrap(), 1, EntryTimes::none());
        let mut coalescer = SpringHandlersFilter
            .coalescer(&Claim::same_path(&e.path))
            .unwrap();
        let mut content: &[u8] = b"http\\://x/y.xsd=org/x/y.xsd\n";
        coalescer
            .absorb(Fragment { entry: &e, source: &src, content: &mut content })
            .unwrap();
        let mut out = Vec::new();
        coalescer.emit(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "http\\://x/y.xsd=org/x/y.xsd\n");
    }
}
