//! `var(--name)` substitution

use std::ops::Range;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::lookup::VariableLookup;

/// Value substituted for references to names missing from the table
pub const FALLBACK_VALUE: &str = "inherit";

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"var\(--([a-zA-Z0-9_-]+)\)").expect("Invalid variable reference pattern")
    })
}

/// A single `var(--name)` occurrence in a stylesheet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarRef<'a> {
    /// Variable name without the `--` prefix
    pub name: &'a str,
    /// Byte range of the whole `var(...)` token
    pub span: Range<usize>,
}

/// Iterate over every variable reference in `text`, in order of appearance.
pub fn references(text: &str) -> impl Iterator<Item = VarRef<'_>> {
    reference_pattern().captures_iter(text).filter_map(|caps| {
        let token = caps.get(0)?;
        let name = caps.get(1)?;
        Some(VarRef {
            name: name.as_str(),
            span: token.range(),
        })
    })
}

/// Replace every `var(--name)` in `text` with its value from `variables`.
///
/// Names missing from the table resolve to [`FALLBACK_VALUE`]. The scan is a
/// single left-to-right pass over the original text: substituted values are
/// copied as-is and never expanded again.
pub fn resolve<V: VariableLookup + ?Sized>(text: &str, variables: &V) -> String {
    reference_pattern()
        .replace_all(text, |caps: &Captures<'_>| {
            variables.lookup(&caps[1]).unwrap_or(FALLBACK_VALUE)
        })
        .into_owned()
}

/// Names referenced by `text` that have no entry in `variables`.
///
/// Each name is reported once, in order of first appearance.
pub fn unresolved<V: VariableLookup + ?Sized>(text: &str, variables: &V) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for var in references(text) {
        if variables.lookup(var.name).is_none() && !missing.iter().any(|m| m == var.name) {
            missing.push(var.name.to_string());
        }
    }
    missing
}
