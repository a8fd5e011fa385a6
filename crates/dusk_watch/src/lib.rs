//! Dusk file watch registry
//!
//! Observes theme files and routes their changes to named subscribers.
//!
//! # Overview
//!
//! - **Deduplicated watches**: one OS watch per path; the first scope wins
//! - **Scoped routing**: [`WatchScope::Component`] changes reach a single
//!   subscriber, [`WatchScope::Global`] and [`WatchScope::DirectoryWide`]
//!   changes are broadcast to all of them
//! - **Settled events**: only content writes are considered, and bursts on the
//!   same path are coalesced into one dispatch
//! - **Observer**: one optional handler sees every routed change before the
//!   subscribers, even when nobody is subscribed
//! - **Isolated callbacks**: an error or panic in one subscriber is logged and
//!   the rest still run
//!
//! # Example
//!
//! ```rust,ignore
//! use dusk_watch::{FileWatchRegistry, WatchScope, WatcherConfig};
//!
//! let registry = FileWatchRegistry::new(WatcherConfig::default())?;
//! registry.watch("/home/me/.config/dusk/panel.css", WatchScope::component("panel"));
//! registry.subscribe("panel", |event| {
//!     println!("{} changed", event.path.display());
//!     Ok(())
//! });
//! ```

mod backend;
mod dispatcher;
mod error;
mod registry;
mod scope;

pub use backend::{is_content_change, NotifyBackend, WatchBackend};
pub use error::{CallbackError, Result, WatchError};
pub use registry::{ChangeCallback, ChangeObserver, FileWatchRegistry, WatcherConfig};
pub use scope::{ChangeEvent, WatchScope};
