//! Theme engine error types

use std::path::PathBuf;

use dusk_watch::WatchError;
use thiserror::Error;

/// Why the root theme document could not be loaded
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("document not found")]
    Missing,

    #[error("could not read document: {0}")]
    Read(#[source] std::io::Error),

    #[error("malformed document: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("invalid document: {0}")]
    Shape(String),
}

/// The injected style compiler rejected a resolved stylesheet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileError {
    message: String,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Engine configuration could not be loaded
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse theme config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Theme engine errors
///
/// All of these are recoverable: the engine logs them and keeps serving the
/// last good document and artifacts.
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("failed to load theme document {}: {source}", path.display())]
    DocumentLoad {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("component `{0}` is not declared in the theme document")]
    UnknownComponent(String),

    #[error("stylesheet for `{component}` not found at {}", path.display())]
    ComponentSourceMissing { component: String, path: PathBuf },

    #[error("failed to read stylesheet for `{component}` at {}: {source}", path.display())]
    ComponentSourceRead {
        component: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile stylesheet for `{component}`: {source}")]
    Compile {
        component: String,
        #[source]
        source: CompileError,
    },

    #[error("failed to create theme directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("theme manager is shut down")]
    ShutDown,
}

/// Result type for theme operations
pub type Result<T> = std::result::Result<T, ThemeError>;
