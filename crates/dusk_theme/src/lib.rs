//! Dusk live theme engine
//!
//! Loads a theme directory, resolves `var(--name)` references in each
//! component's stylesheet against the document's global variables, compiles
//! the result and keeps it current while files change on disk.
//!
//! A theme directory looks like:
//!
//! ```text
//! theme/
//! ├── theme.json      { "global": { ... }, "components": { "panel": "panel.css" } }
//! ├── panel.css
//! └── dock/dock.css
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use dusk_theme::{PlainCompiler, ThemeConfig, ThemeManager};
//!
//! # fn main() -> dusk_theme::Result<()> {
//! let manager = ThemeManager::new(ThemeConfig::new("/home/me/.config/dusk"), PlainCompiler)?;
//!
//! manager.register_component("panel", || println!("panel style changed"));
//!
//! if let Some(artifact) = manager.get_component_artifact("panel") {
//!     println!("{}", artifact.resolved_text());
//! }
//! # Ok(())
//! # }
//! ```

mod artifact;
mod compiler;
mod config;
mod document;
mod error;
mod manager;

pub use artifact::{ComponentArtifact, ComponentState};
pub use compiler::{PlainCompiler, StyleCompiler};
pub use config::ThemeConfig;
pub use document::{ThemeDocument, THEME_DOCUMENT};
pub use error::{CompileError, ConfigError, DocumentError, Result, ThemeError};
pub use manager::{ReloadSummary, ThemeManager};

pub use dusk_watch::{FileWatchRegistry, WatchScope, WatcherConfig};
