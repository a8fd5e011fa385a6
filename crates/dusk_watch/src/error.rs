//! Watch registry error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while establishing or tearing down watches
#[derive(Error, Debug)]
pub enum WatchError {
    /// The OS watch for a path could not be created
    #[error("failed to watch {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The OS watch for a path could not be removed
    #[error("failed to unwatch {}: {source}", path.display())]
    Teardown {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The notify watcher itself could not be created
    #[error("file watcher unavailable: {0}")]
    Backend(#[source] notify::Error),

    /// The dispatcher thread could not be started
    #[error("failed to start watch dispatcher: {0}")]
    Dispatcher(#[source] std::io::Error),

    /// The registry has been shut down
    #[error("watch registry is shut down")]
    ShutDown,
}

/// A subscriber's change handler failed
///
/// These are logged by the registry and never propagated.
#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("change callback for `{component}` failed: {source:#}")]
    Failed {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("change callback for `{component}` panicked: {message}")]
    Panicked { component: String, message: String },
}

/// Result type for watch operations
pub type Result<T> = std::result::Result<T, WatchError>;
