//! JAR manifest codec (main section only).
//!
//! Lines are `Name: value`, at most 72 bytes each; longer lines continue on
//! the next line prefixed by a single space. The main section ends at the
//! first blank line. Per-entry sections are not carried into merged output.

/// Path of the manifest inside a JAR.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

pub const MANIFEST_VERSION: &str = "Manifest-Version";
pub const CREATED_BY: &str = "Created-By";
pub const MAIN_CLASS: &str = "Main-Class";

const MAX_LINE: usize = 72;

/// Main-section attributes of a manifest, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the main section. Malformed lines are ignored.
    pub fn parse(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let mut manifest = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)) {
            if line.is_empty() {
                break;
            }
            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(continuation);
                }
                continue;
            }
            if let Some((name, value)) = current.take() {
                manifest.set(name, value);
            }
            current = line
                .split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim_start().to_string()))
                .filter(|(name, _)| !name.is_empty());
        }
        if let Some((name, value)) = current {
            manifest.set(name, value);
        }
        manifest
    }

    /// Look up an attribute; names are case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// The `Main-Class` attribute, if declared and non-empty.
    pub fn main_class(&self) -> Option<&str> {
        self.get(MAIN_CLASS).filter(|v| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Serialize with CRLF line endings and 72-byte line wrapping.
    /// `Manifest-Version` is always written first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        let version = self.get(MANIFEST_VERSION).unwrap_or("1.0");
        write_wrapped(&mut out, &format!("{MANIFEST_VERSION}: {version}"));
        for (name, value) in &self.attributes {
            if name.eq_ignore_ascii_case(MANIFEST_VERSION) {
                continue;
            }
            write_wrapped(&mut out, &format!("{name}: {value}"));
        }
        out.push_str("\r\n");
        out.into_bytes()
    }
}

fn write_wrapped(out: &mut String, line: &str) {
    let mut rest = line;
    let mut limit = MAX_LINE;
    loop {
        if rest.len() <= limit {
            out.push_str(rest);
            out.push_str("\r\n");
            return;
        }
        let mut split = limit;
        while !rest.is_char_boundary(split) {
            split -= 1;
        }
        out.push_str(&rest[..split]);
        out.push_str("\r\n ");
        rest = &rest[split..];
        // Continuation lines spend one byte on the leading space.
        limit = MAX_LINE - 1;
    }
}
