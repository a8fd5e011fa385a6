use std::fmt;
use std::path::Path;

/// Who is affected when a watched path changes
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WatchScope {
    /// The root theme document; every subscriber is notified
    Global,
    /// A single component's stylesheet
    Component(String),
    /// A whole directory; every subscriber is notified
    DirectoryWide,
}

impl WatchScope {
    pub fn component(name: impl Into<String>) -> Self {
        WatchScope::Component(name.into())
    }

    /// Whether changes under this scope go to every subscriber
    pub fn is_broadcast(&self) -> bool {
        matches!(self, WatchScope::Global | WatchScope::DirectoryWide)
    }
}

impl fmt::Display for WatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchScope::Global => f.write_str("global"),
            WatchScope::Component(name) => write!(f, "component:{name}"),
            WatchScope::DirectoryWide => f.write_str("directory"),
        }
    }
}

/// A change delivered to a subscriber
#[derive(Clone, Copy, Debug)]
pub struct ChangeEvent<'a> {
    /// The subscriber being notified
    pub component: &'a str,
    /// The path whose content changed
    pub path: &'a Path,
    /// The scope that routed the change here
    pub scope: &'a WatchScope,
}
