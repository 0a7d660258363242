use jarmerge_archive::manifest::{CREATED_BY, MAIN_CLASS, MANIFEST_VERSION};
use jarmerge_archive::{Manifest, INDEX_PATH, MANIFEST_PATH};
use jarmerge_types::EntryPath;

/// Value of the `Created-By` attribute of every merged archive.
pub const CREATOR: &str = concat!("jarmerge ", env!("CARGO_PKG_VERSION"));

/// Whether `path` is the reserved manifest location. Input manifests are
/// never copied; the output gets a synthesized one.
pub fn is_manifest(path: &EntryPath) -> bool {
    path.as_str().eq_ignore_ascii_case(MANIFEST_PATH)
}

/// Whether `path` is the index location written when an index is generated.
pub fn is_index_list(path: &EntryPath) -> bool {
    path.as_str().eq_ignore_ascii_case(INDEX_PATH)
}

/// The manifest written to the output archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputManifest {
    main_class: Option<String>,
}

impl OutputManifest {
    /// Resolve the main class: an explicit override wins, then the class
    /// inherited from the first input manifest that declared one.
    pub fn resolve(override_class: Option<&str>, inherited: Option<&str>) -> Self {
        let main_class = override_class
            .or(inherited)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from);
        Self { main_class }
    }

    pub fn main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    pub fn to_manifest(&self) -> Manifest {
        let mut manifest = Manifest::new();
        manifest.set(MANIFEST_VERSION, "1.0");
        manifest.set(CREATED_BY, CREATOR);
        if let Some(main_class) = &self.main_class {
            manifest.set(MAIN_CLASS, main_class.as_str());
        }
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins() {
        let m = OutputManifest::resolve(Some("com.x.Cli"), Some("com.y.Main"));
        assert_eq!(m.main_class(), Some("com.x.Cli"));
    }

    #[test]
    fn inherited_when_no_override() {
        let m = OutputManifest::resolve(None, Some(" com.y.Main "));
        assert_eq!(m.main_class(), Some("com.y.Main"));
        assert_eq!(OutputManifest::resolve(None, None).main_class(), None);
    }

    #[test]
    fn fixed_attributes_always_set() {
        let manifest = OutputManifest::resolve(None, None).to_manifest();
        assert_eq!(manifest.get(MANIFEST_VERSION), Some("1.0"));
        assert_eq!(manifest.get(CREATED_BY), Some(CREATOR));
        assert_eq!(manifest.get(MAIN_CLASS), None);
    }

    #[test]
    fn manifest_path_case_insensitive() {
        assert!(is_manifest(&EntryPath::new("META-INF/MANIFEST.MF").unwrap()));
        assert!(is_manifest(&EntryPath::new("meta-inf/manifest.mf").unwrap()));
        assert!(!is_manifest(&EntryPath::new("META-INF/MANIFEST.MF.bak").unwrap()));
    }

    #[test]
    fn index_path_case_insensitive() {
        assert!(is_index_list(&EntryPath::new("META-INF/INDEX.LIST").unwrap()));
        assert!(is_index_list(&EntryPath::new("Meta-Inf/index.list").unwrap()));
        assert!(!is_index_list(&EntryPath::new("INDEX.LIST").unwrap()));
    }
}
