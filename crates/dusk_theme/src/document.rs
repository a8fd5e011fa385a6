//! Root theme document (`theme.json`)
//!
//! ```json
//! {
//!   "global": { "primary": "#1e1e1e", "font-size": 10 },
//!   "components": { "panel": "panel.css", "dock": "dock/dock.css" }
//! }
//! ```
//!
//! `global` is a flat table of variable values. Strings are used as-is,
//! numbers and booleans are stringified, anything else is skipped.
//! `components` maps component names to stylesheet paths relative to the
//! theme directory.

use std::collections::BTreeMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rustc_hash::FxHasher;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DocumentError;

/// File name of the root document inside a theme directory
pub const THEME_DOCUMENT: &str = "theme.json";

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    global: BTreeMap<String, Value>,
    components: Option<BTreeMap<String, PathBuf>>,
}

/// Parsed root configuration of a theme directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThemeDocument {
    theme_dir: PathBuf,
    global_variables: BTreeMap<String, String>,
    component_sources: BTreeMap<String, PathBuf>,
    fingerprint: u64,
}

fn variable_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn fingerprint(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Raw text of `theme_dir/theme.json`
pub(crate) fn read_text(theme_dir: &Path) -> Result<String, DocumentError> {
    fs::read_to_string(ThemeDocument::path_in(theme_dir)).map_err(|err| match err.kind() {
        ErrorKind::NotFound => DocumentError::Missing,
        _ => DocumentError::Read(err),
    })
}

impl ThemeDocument {
    /// An empty document: no variables, no components
    pub fn empty(theme_dir: impl Into<PathBuf>) -> Self {
        Self {
            theme_dir: theme_dir.into(),
            global_variables: BTreeMap::new(),
            component_sources: BTreeMap::new(),
            fingerprint: 0,
        }
    }

    /// Path of the root document for `theme_dir`
    pub fn path_in(theme_dir: &Path) -> PathBuf {
        theme_dir.join(THEME_DOCUMENT)
    }

    /// Read and parse `theme_dir/theme.json`.
    pub fn load(theme_dir: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let theme_dir = theme_dir.as_ref();
        let text = read_text(theme_dir)?;
        Self::parse(theme_dir, &text)
    }

    /// Parse document text belonging to `theme_dir`.
    pub fn parse(theme_dir: impl Into<PathBuf>, text: &str) -> Result<Self, DocumentError> {
        let raw: RawDocument = serde_json::from_str(text).map_err(DocumentError::Malformed)?;

        let mut global_variables = BTreeMap::new();
        for (name, value) in raw.global {
            match variable_value(value) {
                Some(value) => {
                    global_variables.insert(name, value);
                }
                None => warn!(variable = %name, "skipping non-scalar global variable"),
            }
        }

        let component_sources = match raw.components {
            Some(components) => components,
            None => {
                debug!("theme document declares no components");
                BTreeMap::new()
            }
        };
        for (name, source) in &component_sources {
            if name.is_empty() {
                return Err(DocumentError::Shape("empty component name".to_string()));
            }
            if source.as_os_str().is_empty() {
                return Err(DocumentError::Shape(format!(
                    "component `{name}` has an empty stylesheet path"
                )));
            }
        }

        Ok(Self {
            theme_dir: theme_dir.into(),
            global_variables,
            component_sources,
            fingerprint: fingerprint(text),
        })
    }

    pub fn theme_dir(&self) -> &Path {
        &self.theme_dir
    }

    pub fn global_variables(&self) -> &BTreeMap<String, String> {
        &self.global_variables
    }

    /// Declared component names, sorted
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.component_sources.keys().map(String::as_str)
    }

    pub fn declares(&self, component: &str) -> bool {
        self.component_sources.contains_key(component)
    }

    /// Stylesheet path of `component`, joined onto the theme directory
    pub fn source_path(&self, component: &str) -> Option<PathBuf> {
        self.component_sources
            .get(component)
            .map(|relative| self.theme_dir.join(relative))
    }

    /// Hash of the text this document was parsed from (0 for [`empty`](Self::empty))
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_globals_and_components() {
        let doc = ThemeDocument::parse(
            "/theme",
            r##"{
                "global": { "primary": "#1e1e1e", "text_color": "#ffffff" },
                "components": { "panel": "panel.css", "dock": "dock/dock.css" }
            }"##,
        )
        .unwrap();

        assert_eq!(
            doc.global_variables().get("primary").map(String::as_str),
            Some("#1e1e1e")
        );
        assert_eq!(doc.component_names().collect::<Vec<_>>(), vec!["dock", "panel"]);
        assert_eq!(
            doc.source_path("dock"),
            Some(PathBuf::from("/theme/dock/dock.css"))
        );
        assert_eq!(doc.source_path("launcher"), None);
    }

    #[test]
    fn scalar_globals_are_stringified_and_nested_ones_skipped() {
        let doc = ThemeDocument::parse(
            "/theme",
            r#"{
                "global": {
                    "font-size": 10,
                    "opacity": 0.5,
                    "rounded": true,
                    "palette": { "a": "b" },
                    "list": [1, 2],
                    "nothing": null
                },
                "components": {}
            }"#,
        )
        .unwrap();

        let globals: Vec<(&str, &str)> = doc
            .global_variables()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            globals,
            vec![("font-size", "10"), ("opacity", "0.5"), ("rounded", "true")]
        );
    }

    #[test]
    fn missing_sections_are_tolerated() {
        let doc = ThemeDocument::parse("/theme", "{}").unwrap();
        assert!(doc.global_variables().is_empty());
        assert_eq!(doc.component_names().count(), 0);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = ThemeDocument::parse("/theme", r#"{ "global": { "#).unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = ThemeDocument::parse("/theme", "[1, 2, 3]").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn non_string_component_paths_are_rejected() {
        let err =
            ThemeDocument::parse("/theme", r#"{ "components": { "panel": 3 } }"#).unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn empty_component_path_is_rejected() {
        let err =
            ThemeDocument::parse("/theme", r#"{ "components": { "panel": "" } }"#).unwrap_err();
        assert!(matches!(err, DocumentError::Shape(_)));
    }

    #[test]
    fn fingerprint_tracks_document_text() {
        let a = ThemeDocument::parse("/theme", r#"{ "global": { "a": "1" } }"#).unwrap();
        let same = ThemeDocument::parse("/theme", r#"{ "global": { "a": "1" } }"#).unwrap();
        let b = ThemeDocument::parse("/theme", r#"{ "global": { "a": "2" } }"#).unwrap();

        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(ThemeDocument::empty("/theme").fingerprint(), 0);
    }

    #[test]
    fn load_reports_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let err = ThemeDocument::load(dir.path()).unwrap_err();
        assert!(matches!(err, DocumentError::Missing));
    }

    #[test]
    fn load_reads_theme_json_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(THEME_DOCUMENT),
            r##"{ "global": { "accent": "#007acc" }, "components": { "panel": "panel.css" } }"##,
        )
        .unwrap();

        let doc = ThemeDocument::load(dir.path()).unwrap();
        assert_eq!(doc.theme_dir(), dir.path());
        assert!(doc.declares("panel"));
        assert_eq!(
            doc.source_path("panel"),
            Some(dir.path().join("panel.css"))
        );
    }
}
