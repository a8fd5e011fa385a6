//! Background thread that turns raw notify events into settled dispatches

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Mutex, Weak};
use std::time::Duration;

use notify::Event;
use tracing::{debug, trace, warn};

use crate::backend::is_content_change;
use crate::registry::{dispatch_change, normalize, RegistryState};

pub(crate) enum DispatchMessage {
    Fs(notify::Result<Event>),
    Stop,
}

/// Collect content-change events and dispatch each touched path once it has
/// been quiet for `settle`.
pub(crate) fn run(
    events: Receiver<DispatchMessage>,
    state: Weak<Mutex<RegistryState>>,
    settle: Duration,
) {
    let mut pending: Vec<PathBuf> = Vec::new();

    loop {
        let next = if pending.is_empty() {
            events.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            events.recv_timeout(settle)
        };

        match next {
            Ok(DispatchMessage::Fs(Ok(event))) => {
                if !is_content_change(&event.kind) {
                    trace!(kind = ?event.kind, paths = ?event.paths, "ignoring fs event");
                    continue;
                }
                for path in event.paths.iter().map(|p| normalize(p)) {
                    if !pending.contains(&path) {
                        pending.push(path);
                    }
                }
            }
            Ok(DispatchMessage::Fs(Err(err))) => {
                warn!(error = %err, "file watcher reported an error");
            }
            Ok(DispatchMessage::Stop) => break,
            Err(RecvTimeoutError::Timeout) => {
                let Some(state) = state.upgrade() else {
                    break;
                };
                for path in pending.drain(..) {
                    dispatch_change(&state, &path);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("watch dispatcher stopped");
}
