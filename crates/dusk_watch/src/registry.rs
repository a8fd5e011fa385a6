//! Path → watch mapping and subscriber routing
//!
//! All watch state (entries, subscriptions, the backend) lives behind a single
//! mutex. Registration and dispatch take the same lock, so a change that fires
//! mid-registration never sees a half-updated table. Callbacks run while the
//! lock is held and must not call back into the registry.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::Event;
use rustc_hash::FxHashMap;
use tracing::{debug, error, info, trace, warn};

use crate::backend::{is_content_change, NotifyBackend, WatchBackend};
use crate::dispatcher::{self, DispatchMessage};
use crate::error::{CallbackError, Result, WatchError};
use crate::scope::{ChangeEvent, WatchScope};

/// Handler invoked when a change affects a subscriber
pub type ChangeCallback = Arc<dyn Fn(&ChangeEvent<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Handler that sees every routed change once, before any subscriber
pub type ChangeObserver = Arc<dyn Fn(&Path, &WatchScope) -> anyhow::Result<()> + Send + Sync>;

/// Watch registry configuration
#[derive(Clone, Debug)]
pub struct WatcherConfig {
    /// How long a path must stay quiet before its change is dispatched
    pub settle: Duration,
    /// Watch [`WatchScope::DirectoryWide`] directories recursively
    pub recursive: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(100),
            recursive: false,
        }
    }
}

impl WatcherConfig {
    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

struct WatchEntry {
    scope: WatchScope,
    recursive: bool,
}

pub(crate) struct RegistryState {
    backend: Option<Box<dyn WatchBackend>>,
    entries: FxHashMap<PathBuf, WatchEntry>,
    subscriptions: BTreeMap<String, ChangeCallback>,
    observer: Option<ChangeObserver>,
    shut_down: bool,
}

impl RegistryState {
    /// Find the scope responsible for `path`.
    ///
    /// A path with its own entry is routed by that entry. Otherwise the
    /// nearest directory-wide ancestor claims it (only the direct parent
    /// unless that directory is watched recursively).
    fn route(&self, path: &Path) -> Option<WatchScope> {
        if let Some(entry) = self.entries.get(path) {
            return Some(entry.scope.clone());
        }

        path.ancestors()
            .skip(1)
            .enumerate()
            .find_map(|(depth, dir)| {
                let entry = self.entries.get(dir)?;
                let reaches = depth == 0 || entry.recursive;
                (entry.scope == WatchScope::DirectoryWide && reaches)
                    .then_some(WatchScope::DirectoryWide)
            })
    }
}

fn lock(state: &Mutex<RegistryState>) -> MutexGuard<'_, RegistryState> {
    // A panicking callback is already isolated; keep serving after it.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn isolate(
    name: &str,
    call: impl FnOnce() -> anyhow::Result<()>,
) -> std::result::Result<(), CallbackError> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(CallbackError::Failed {
            component: name.to_string(),
            source,
        }),
        Err(payload) => Err(CallbackError::Panicked {
            component: name.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

/// Route a content change on `path` to the observer, then its subscribers.
///
/// Returns how many subscriber callbacks ran (including ones that failed).
pub(crate) fn dispatch_change(state: &Mutex<RegistryState>, path: &Path) -> usize {
    let state = lock(state);
    if state.shut_down {
        return 0;
    }

    let path = normalize(path);
    let Some(scope) = state.route(&path) else {
        trace!(path = %path.display(), "change on unwatched path");
        return 0;
    };
    debug!(path = %path.display(), scope = %scope, "dispatching change");

    if let Some(observer) = &state.observer {
        if let Err(err) = isolate("observer", || observer(&path, &scope)) {
            error!(error = %err, "change observer failed");
        }
    }

    let mut invoked = 0;
    let mut run = |name: &str, callback: &ChangeCallback| {
        let event = ChangeEvent {
            component: name,
            path: &path,
            scope: &scope,
        };
        invoked += 1;
        if let Err(err) = isolate(name, || callback(&event)) {
            error!(component = %name, error = %err, "change callback failed");
        }
    };

    match &scope {
        WatchScope::Component(name) => match state.subscriptions.get(name) {
            Some(callback) => run(name.as_str(), callback),
            None => debug!(component = %name, "no subscriber for component change"),
        },
        WatchScope::Global | WatchScope::DirectoryWide => {
            for (name, callback) in &state.subscriptions {
                run(name.as_str(), callback);
            }
        }
    }

    invoked
}

/// Deduplicated file watches with scoped change routing
pub struct FileWatchRegistry {
    state: Arc<Mutex<RegistryState>>,
    config: WatcherConfig,
    control: Option<Sender<DispatchMessage>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl FileWatchRegistry {
    /// Create a registry backed by the platform's native file watcher.
    ///
    /// Changes are coalesced per path on a background thread and dispatched
    /// once the path has been quiet for [`WatcherConfig::settle`].
    pub fn new(config: WatcherConfig) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let backend = NotifyBackend::new(tx.clone())?;
        let state = Arc::new(Mutex::new(RegistryState {
            backend: Some(Box::new(backend)),
            entries: FxHashMap::default(),
            subscriptions: BTreeMap::new(),
            observer: None,
            shut_down: false,
        }));

        let weak = Arc::downgrade(&state);
        let settle = config.settle;
        let handle = thread::Builder::new()
            .name("dusk-watch".into())
            .spawn(move || dispatcher::run(rx, weak, settle))
            .map_err(WatchError::Dispatcher)?;

        Ok(Self {
            state,
            config,
            control: Some(tx),
            dispatcher: Mutex::new(Some(handle)),
        })
    }

    /// Create a registry over a custom backend.
    ///
    /// No dispatcher thread is started; feed changes in with
    /// [`handle_event`](Self::handle_event) or
    /// [`notify_changed`](Self::notify_changed).
    pub fn with_backend(backend: impl WatchBackend + 'static, config: WatcherConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                backend: Some(Box::new(backend)),
                entries: FxHashMap::default(),
                subscriptions: BTreeMap::new(),
                observer: None,
                shut_down: false,
            })),
            config,
            control: None,
            dispatcher: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Start observing `path`.
    ///
    /// Returns `true` if a new watch was created. A path that is already
    /// watched keeps its original scope. Failures are logged and reported as
    /// `false`; they never propagate.
    pub fn watch(&self, path: impl AsRef<Path>, scope: WatchScope) -> bool {
        let path = normalize(path.as_ref());
        let mut state = lock(&self.state);

        if state.shut_down {
            warn!(path = %path.display(), error = %WatchError::ShutDown, "watch ignored");
            return false;
        }
        if let Some(existing) = state.entries.get(&path) {
            debug!(
                path = %path.display(),
                scope = %existing.scope,
                requested = %scope,
                "path already watched"
            );
            return false;
        }

        let recursive = self.config.recursive && scope == WatchScope::DirectoryWide;
        let result = match state.backend.as_mut() {
            Some(backend) => backend.watch(&path, recursive),
            None => Err(WatchError::ShutDown),
        };

        match result {
            Ok(()) => {
                info!(path = %path.display(), scope = %scope, "watching for changes");
                state.entries.insert(path, WatchEntry { scope, recursive });
                true
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not set up watch");
                false
            }
        }
    }

    /// Register (or replace) the change handler for `component`.
    pub fn subscribe<F>(&self, component: impl Into<String>, callback: F)
    where
        F: Fn(&ChangeEvent<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let component = component.into();
        let mut state = lock(&self.state);

        if state.shut_down {
            warn!(component = %component, "subscribe ignored after shutdown");
            return;
        }
        if state
            .subscriptions
            .insert(component.clone(), Arc::new(callback))
            .is_some()
        {
            debug!(component = %component, "replaced change callback");
        } else {
            debug!(component = %component, "registered change callback");
        }
    }

    /// Install (or replace) the observer.
    ///
    /// The observer runs once for every routed change, before the
    /// subscribers and whether or not any exist. It is held to the same rules
    /// as callbacks: failures are logged and it must not call back into the
    /// registry.
    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(&Path, &WatchScope) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut state = lock(&self.state);
        if state.shut_down {
            warn!("observer ignored after shutdown");
            return;
        }
        if state.observer.replace(Arc::new(observer)).is_some() {
            debug!("replaced change observer");
        }
    }

    /// Feed a raw notify event through the same filter the background
    /// dispatcher applies, dispatching immediately.
    ///
    /// Returns how many callbacks ran.
    pub fn handle_event(&self, event: &Event) -> usize {
        if !is_content_change(&event.kind) {
            trace!(kind = ?event.kind, "ignoring fs event");
            return 0;
        }
        event
            .paths
            .iter()
            .map(|path| dispatch_change(&self.state, path))
            .sum()
    }

    /// Dispatch a content change on `path` right away.
    ///
    /// Returns how many callbacks ran.
    pub fn notify_changed(&self, path: impl AsRef<Path>) -> usize {
        dispatch_change(&self.state, path.as_ref())
    }

    pub fn is_watched(&self, path: impl AsRef<Path>) -> bool {
        self.scope_of(path).is_some()
    }

    /// Scope of the entry for exactly `path`, if one exists
    pub fn scope_of(&self, path: impl AsRef<Path>) -> Option<WatchScope> {
        let path = normalize(path.as_ref());
        lock(&self.state)
            .entries
            .get(&path)
            .map(|entry| entry.scope.clone())
    }

    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = lock(&self.state).entries.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Names with a registered change callback, sorted
    pub fn subscribers(&self) -> Vec<String> {
        lock(&self.state).subscriptions.keys().cloned().collect()
    }

    pub fn is_shut_down(&self) -> bool {
        lock(&self.state).shut_down
    }

    /// Cancel every watch, then drop all subscriptions.
    ///
    /// Once this returns no callback will run again. Safe to call repeatedly.
    pub fn shutdown(&self) {
        {
            let mut state = lock(&self.state);
            if !state.shut_down {
                state.shut_down = true;

                let paths: Vec<PathBuf> = state.entries.keys().cloned().collect();
                if let Some(backend) = state.backend.as_mut() {
                    for path in &paths {
                        if let Err(err) = backend.unwatch(path) {
                            debug!(error = %err, "unwatch during shutdown failed");
                        }
                    }
                }
                state.entries.clear();
                state.backend = None;
                state.subscriptions.clear();
                state.observer = None;
                info!(watches = paths.len(), "watch registry shut down");
            }
        }

        if let Some(control) = &self.control {
            let _ = control.send(DispatchMessage::Stop);
        }
        let handle = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("watch dispatcher thread panicked");
            }
        }
    }
}

impl Drop for FileWatchRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FileWatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatchRegistry")
            .field("config", &self.config)
            .field("watched", &self.watched_paths())
            .field("subscribers", &self.subscribers())
            .finish()
    }
}
