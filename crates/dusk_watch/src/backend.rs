//! OS watch backends

use std::path::Path;
use std::sync::mpsc::Sender;

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::dispatcher::DispatchMessage;
use crate::error::WatchError;

/// Creates and cancels OS-level watches
///
/// The registry calls into its backend while holding its state lock, so
/// implementations must not call back into the registry.
pub trait WatchBackend: Send {
    fn watch(&mut self, path: &Path, recursive: bool) -> Result<(), WatchError>;

    fn unwatch(&mut self, path: &Path) -> Result<(), WatchError>;
}

/// [`WatchBackend`] over the platform's recommended notify watcher
pub struct NotifyBackend {
    watcher: RecommendedWatcher,
}

impl NotifyBackend {
    pub(crate) fn new(events: Sender<DispatchMessage>) -> Result<Self, WatchError> {
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // The dispatcher is gone once the registry shuts down
            let _ = events.send(DispatchMessage::Fs(res));
        })
        .map_err(WatchError::Backend)?;

        Ok(Self { watcher })
    }
}

impl WatchBackend for NotifyBackend {
    fn watch(&mut self, path: &Path, recursive: bool) -> Result<(), WatchError> {
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        self.watcher
            .watch(path, mode)
            .map_err(|source| WatchError::Setup {
                path: path.to_path_buf(),
                source,
            })
    }

    fn unwatch(&mut self, path: &Path) -> Result<(), WatchError> {
        self.watcher
            .unwatch(path)
            .map_err(|source| WatchError::Teardown {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Whether an event kind means "content changed" or "writer finished".
///
/// Creation, removal, renames, metadata updates and plain opens/reads are
/// ignored.
pub fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};

    #[test]
    fn content_writes_pass_the_filter() {
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Data(
            DataChange::Any
        ))));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_content_change(&EventKind::Access(AccessKind::Close(
            AccessMode::Write
        ))));
    }

    #[test]
    fn structural_and_metadata_events_are_ignored() {
        assert!(!is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(!is_content_change(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_content_change(&EventKind::Modify(ModifyKind::Name(
            RenameMode::Both
        ))));
        assert!(!is_content_change(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::WriteTime
        ))));
        assert!(!is_content_change(&EventKind::Access(AccessKind::Open(
            AccessMode::Any
        ))));
        assert!(!is_content_change(&EventKind::Any));
        assert!(!is_content_change(&EventKind::Other));
    }
}
