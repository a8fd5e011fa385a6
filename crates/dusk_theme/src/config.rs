//! Theme engine configuration

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dusk_watch::WatcherConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Theme engine configuration
///
/// ```toml
/// theme_dir = "/home/me/.config/dusk/theme"
/// settle_ms = 100
/// watch_on_start = true
/// recursive = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeConfig {
    /// Directory holding `theme.json` and the component stylesheets
    pub theme_dir: PathBuf,
    /// Quiet period before a file change is dispatched
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Watch the theme document and directory as soon as the manager starts
    #[serde(default = "default_true")]
    pub watch_on_start: bool,
    /// Watch the theme directory recursively
    #[serde(default)]
    pub recursive: bool,
}

fn default_settle_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

impl ThemeConfig {
    pub fn new(theme_dir: impl Into<PathBuf>) -> Self {
        Self {
            theme_dir: theme_dir.into(),
            settle_ms: default_settle_ms(),
            watch_on_start: true,
            recursive: false,
        }
    }

    pub fn settle_ms(mut self, settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    pub fn watch_on_start(mut self, watch_on_start: bool) -> Self {
        self.watch_on_start = watch_on_start;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Parse a TOML configuration string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Settings for the file watch registry
    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig::default()
            .settle(Duration::from_millis(self.settle_ms))
            .recursive(self.recursive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ThemeConfig::from_toml_str(r#"theme_dir = "/tmp/dusk""#).unwrap();
        assert_eq!(config, ThemeConfig::new("/tmp/dusk"));
        assert_eq!(config.settle_ms, 100);
        assert!(config.watch_on_start);
        assert!(!config.recursive);
    }

    #[test]
    fn full_toml_overrides_defaults() {
        let config = ThemeConfig::from_toml_str(
            r#"
            theme_dir = "themes/night"
            settle_ms = 250
            watch_on_start = false
            recursive = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            ThemeConfig::new("themes/night")
                .settle_ms(250)
                .watch_on_start(false)
                .recursive(true)
        );
        let watcher = config.watcher_config();
        assert_eq!(watcher.settle, Duration::from_millis(250));
        assert!(watcher.recursive);
    }

    #[test]
    fn missing_theme_dir_is_an_error() {
        assert!(matches!(
            ThemeConfig::from_toml_str("settle_ms = 10"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ThemeConfig::load("/definitely/not/here/dusk.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
