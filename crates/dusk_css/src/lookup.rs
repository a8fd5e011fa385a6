use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read-only access to a table of variable values.
///
/// Keys are variable names without the leading `--`.
pub trait VariableLookup {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> VariableLookup for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl VariableLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<T: VariableLookup + ?Sized> VariableLookup for &T {
    fn lookup(&self, name: &str) -> Option<&str> {
        (**self).lookup(name)
    }
}
