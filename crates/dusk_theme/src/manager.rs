//! Theme manager
//!
//! Owns the current [`ThemeDocument`] and one [`ComponentArtifact`] per
//! declared component, and keeps both in step with the theme directory.
//!
//! Every read → build → swap sequence runs under a reload lock, so reloads
//! never interleave. The artifact table sits behind a second, short-lived
//! lock that lookups take; it is only held for the swap itself. Neither lock
//! is held while calling into the watch registry. File changes arrive through
//! the registry's observer with the registry's lock held, so the lock order is
//! always registry → reload → state.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dusk_css::{resolve, unresolved};
use dusk_watch::{ChangeEvent, FileWatchRegistry, WatchScope};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, trace, warn};

use crate::artifact::{ComponentArtifact, ComponentState};
use crate::compiler::{PlainCompiler, StyleCompiler};
use crate::config::ThemeConfig;
use crate::document::{self, ThemeDocument};
use crate::error::{DocumentError, Result, ThemeError};

/// Outcome of a full [`ThemeManager::reload`]
#[derive(Debug, Default)]
pub struct ReloadSummary {
    /// Components whose artifact was rebuilt, sorted
    pub resolved: Vec<String>,
    /// Components that kept their previous artifact, and why
    pub failed: Vec<(String, ThemeError)>,
}

impl ReloadSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

struct ThemeState<H> {
    document: Arc<ThemeDocument>,
    artifacts: FxHashMap<String, Arc<ComponentArtifact<H>>>,
    /// Components whose last reload failed while an older artifact exists
    stale: FxHashSet<String>,
    shut_down: bool,
}

impl<H> ThemeState<H> {
    fn new(document: ThemeDocument) -> Self {
        Self {
            document: Arc::new(document),
            artifacts: FxHashMap::default(),
            stale: FxHashSet::default(),
            shut_down: false,
        }
    }

    fn store(&mut self, artifact: ComponentArtifact<H>) {
        self.stale.remove(artifact.component());
        self.artifacts
            .insert(artifact.component().to_string(), Arc::new(artifact));
    }

    fn mark_failed(&mut self, component: &str) {
        if self.artifacts.contains_key(component) {
            self.stale.insert(component.to_string());
        }
    }

    fn component_state(&self, component: &str) -> ComponentState {
        if !self.artifacts.contains_key(component) {
            ComponentState::Unloaded
        } else if self.stale.contains(component) {
            ComponentState::Stale
        } else {
            ComponentState::Loaded
        }
    }
}

struct Shared<C: StyleCompiler> {
    theme_dir: PathBuf,
    compiler: C,
    reload_lock: Mutex<()>,
    state: Mutex<ThemeState<C::Handle>>,
}

fn same_file(candidate: &Path, changed: &Path) -> bool {
    candidate == changed || fs::canonicalize(candidate).is_ok_and(|c| c == changed)
}

impl<C: StyleCompiler> Shared<C> {
    fn state(&self) -> MutexGuard<'_, ThemeState<C::Handle>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reloading(&self) -> MutexGuard<'_, ()> {
        self.reload_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn document_error(&self, source: DocumentError) -> ThemeError {
        ThemeError::DocumentLoad {
            path: ThemeDocument::path_in(&self.theme_dir),
            source,
        }
    }

    /// Read, resolve and compile one component against `document`.
    fn build_artifact(
        &self,
        document: &ThemeDocument,
        component: &str,
    ) -> Result<ComponentArtifact<C::Handle>> {
        let path = document
            .source_path(component)
            .ok_or_else(|| ThemeError::UnknownComponent(component.to_string()))?;

        let raw_text = fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ThemeError::ComponentSourceMissing {
                component: component.to_string(),
                path: path.clone(),
            },
            _ => ThemeError::ComponentSourceRead {
                component: component.to_string(),
                path: path.clone(),
                source,
            },
        })?;

        let globals = document.global_variables();
        let missing = unresolved(&raw_text, globals);
        if !missing.is_empty() {
            debug!(
                component = %component,
                missing = ?missing,
                "undefined variables resolve to inherit"
            );
        }
        let resolved_text = resolve(&raw_text, globals);

        let compiled = self
            .compiler
            .compile(component, &resolved_text)
            .map_err(|source| ThemeError::Compile {
                component: component.to_string(),
                source,
            })?;

        Ok(ComponentArtifact::new(
            component.to_string(),
            raw_text,
            resolved_text,
            compiled,
        ))
    }

    fn reload(&self) -> Result<ReloadSummary> {
        let _reloading = self.reloading();
        if self.state().shut_down {
            return Err(ThemeError::ShutDown);
        }
        let document = ThemeDocument::load(&self.theme_dir).map_err(|source| {
            let err = self.document_error(source);
            warn!(error = %err, "keeping previous theme document");
            err
        })?;
        self.apply_document(document)
    }

    /// Resolve every component of `document`, then swap document and
    /// artifacts in together. Callers hold the reload lock.
    fn apply_document(&self, document: ThemeDocument) -> Result<ReloadSummary> {
        let mut summary = ReloadSummary::default();
        let mut built = Vec::new();
        for component in document.component_names() {
            match self.build_artifact(&document, component) {
                Ok(artifact) => built.push(artifact),
                Err(err) => {
                    warn!(component = %component, error = %err, "keeping previous artifact");
                    summary.failed.push((component.to_string(), err));
                }
            }
        }

        let mut state = self.state();
        if state.shut_down {
            return Err(ThemeError::ShutDown);
        }

        state.artifacts.retain(|name, _| document.declares(name));
        state.stale.retain(|name| document.declares(name));
        for artifact in built {
            summary.resolved.push(artifact.component().to_string());
            state.store(artifact);
        }
        for (component, _) in &summary.failed {
            state.mark_failed(component);
        }
        state.document = Arc::new(document);
        drop(state);

        info!(
            resolved = summary.resolved.len(),
            failed = summary.failed.len(),
            "theme reloaded"
        );
        Ok(summary)
    }

    fn reload_component(&self, component: &str) -> Result<()> {
        let _reloading = self.reloading();
        let document = {
            let state = self.state();
            if state.shut_down {
                return Err(ThemeError::ShutDown);
            }
            Arc::clone(&state.document)
        };

        let artifact = match self.build_artifact(&document, component) {
            Ok(artifact) => artifact,
            Err(err) => {
                warn!(component = %component, error = %err, "component reload failed");
                self.state().mark_failed(component);
                return Err(err);
            }
        };

        let mut state = self.state();
        if state.shut_down {
            return Err(ThemeError::ShutDown);
        }
        state.store(artifact);
        debug!(component = %component, "component reloaded");
        Ok(())
    }

    /// Re-read the document and fully reload if its text changed.
    ///
    /// Returns the reload summary, or `None` when the text is unchanged (in
    /// which case it is not parsed).
    fn sync_document(&self) -> Result<Option<ReloadSummary>> {
        let _reloading = self.reloading();
        if self.state().shut_down {
            return Err(ThemeError::ShutDown);
        }
        let text = document::read_text(&self.theme_dir).map_err(|e| self.document_error(e))?;
        if document::fingerprint(&text) == self.state().document.fingerprint() {
            return Ok(None);
        }
        let parsed =
            ThemeDocument::parse(&self.theme_dir, &text).map_err(|e| self.document_error(e))?;
        self.apply_document(parsed).map(Some)
    }

    /// Bring the cache up to date with a content change on `path`.
    fn apply_change(&self, path: &Path, scope: &WatchScope) -> Result<()> {
        let component = match scope {
            WatchScope::Global => return self.sync_document().map(|_| ()),
            WatchScope::Component(name) => name.clone(),
            WatchScope::DirectoryWide => {
                if same_file(&ThemeDocument::path_in(&self.theme_dir), path) {
                    return self.sync_document().map(|_| ());
                }
                let document = Arc::clone(&self.state().document);
                let owner = document.component_names().find(|name| {
                    document
                        .source_path(name)
                        .is_some_and(|source| same_file(&source, path))
                });
                match owner {
                    Some(name) => name.to_string(),
                    None => {
                        trace!(path = %path.display(), "change outside any stylesheet");
                        return Ok(());
                    }
                }
            }
        };

        if !self.state().document.declares(&component) {
            debug!(component = %component, "change to undeclared component ignored");
            return Ok(());
        }
        self.reload_component(&component)
    }
}

/// Live theme engine for one theme directory
///
/// `C` compiles resolved stylesheets into the handles the windowing layer
/// applies; [`PlainCompiler`] keeps the resolved text.
pub struct ThemeManager<C: StyleCompiler = PlainCompiler> {
    shared: Arc<Shared<C>>,
    registry: Arc<FileWatchRegistry>,
}

impl<C: StyleCompiler> ThemeManager<C> {
    /// Start a manager with its own native file watcher.
    pub fn new(config: ThemeConfig, compiler: C) -> Result<Self> {
        let registry = FileWatchRegistry::new(config.watcher_config())?;
        Self::with_registry(config, compiler, Arc::new(registry))
    }

    /// Start a manager from a TOML configuration file.
    pub fn from_config_file(path: impl AsRef<Path>, compiler: C) -> Result<Self> {
        let config = ThemeConfig::load(path)?;
        Self::new(config, compiler)
    }

    /// Start a manager on an existing watch registry.
    ///
    /// Creates the theme directory if needed and performs the initial
    /// reload. A missing or broken `theme.json` is logged, not returned: the
    /// manager starts empty and picks the document up on the next reload.
    ///
    /// The manager installs itself as the registry's observer, so every
    /// routed change to `theme.json` or a declared stylesheet refreshes the
    /// cache whether or not a component is registered. A registry serves one
    /// manager and is shut down together with it.
    pub fn with_registry(
        config: ThemeConfig,
        compiler: C,
        registry: Arc<FileWatchRegistry>,
    ) -> Result<Self> {
        let theme_dir = config.theme_dir.clone();
        if !theme_dir.is_dir() {
            fs::create_dir_all(&theme_dir).map_err(|source| ThemeError::CreateDir {
                path: theme_dir.clone(),
                source,
            })?;
            info!(path = %theme_dir.display(), "created theme directory");
        }

        let manager = Self {
            shared: Arc::new(Shared {
                theme_dir: theme_dir.clone(),
                compiler,
                reload_lock: Mutex::new(()),
                state: Mutex::new(ThemeState::new(ThemeDocument::empty(theme_dir))),
            }),
            registry,
        };

        let shared = Arc::downgrade(&manager.shared);
        manager
            .registry
            .observe(move |path: &Path, scope: &WatchScope| {
                let Some(shared) = shared.upgrade() else {
                    return Ok(());
                };
                shared.apply_change(path, scope).map_err(Into::into)
            });

        if let Err(err) = manager.reload() {
            warn!(error = %err, "initial theme load failed");
        }
        if config.watch_on_start {
            manager.watch_for_changes();
        }
        Ok(manager)
    }

    /// Reload `theme.json` and re-resolve every declared component.
    ///
    /// If the document cannot be loaded, nothing changes and the error is
    /// returned. Otherwise per-component failures are collected in the
    /// summary and those components keep their previous artifact.
    pub fn reload(&self) -> Result<ReloadSummary> {
        self.shared.reload()
    }

    /// Re-resolve one component against the current global variables.
    pub fn reload_component(&self, component: &str) -> Result<()> {
        self.shared.reload_component(component)
    }

    /// Watch `component`'s stylesheet and call `on_changed` after each change
    /// that reaches it.
    ///
    /// The stylesheet is the document's mapping for `component`, or
    /// `<theme_dir>/<component>.css` for undeclared names. It is only watched
    /// if it exists; the subscription is installed either way so document and
    /// directory changes still reach the component.
    ///
    /// The cache is already refreshed when `on_changed` runs. It is skipped
    /// while the component has no current artifact (undeclared, never
    /// resolved, or stale after a failed reload).
    pub fn register_component<F>(&self, component: impl Into<String>, on_changed: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let component = component.into();
        let source = self.component_source(&component);
        if source.is_file() {
            self.registry
                .watch(&source, WatchScope::component(component.clone()));
        } else {
            debug!(
                component = %component,
                path = %source.display(),
                "stylesheet does not exist yet, not watching it"
            );
        }

        let shared = Arc::downgrade(&self.shared);
        self.registry
            .subscribe(component, move |event: &ChangeEvent<'_>| {
                let Some(shared) = shared.upgrade() else {
                    return Ok(());
                };
                let state = shared.state().component_state(event.component);
                if state == ComponentState::Loaded {
                    on_changed();
                } else {
                    debug!(component = %event.component, state = ?state, "change not forwarded");
                }
                Ok(())
            });
    }

    /// Watch `theme.json` (broadcast to every component) and the theme
    /// directory itself.
    pub fn watch_for_changes(&self) {
        let document_path = self.document_path();
        self.registry.watch(&document_path, WatchScope::Global);
        self.registry
            .watch(&self.shared.theme_dir, WatchScope::DirectoryWide);
    }

    /// Latest artifact of `component`, or `None` if it never resolved
    pub fn get_component_artifact(
        &self,
        component: &str,
    ) -> Option<Arc<ComponentArtifact<C::Handle>>> {
        self.shared.state().artifacts.get(component).cloned()
    }

    pub fn component_state(&self, component: &str) -> ComponentState {
        self.shared.state().component_state(component)
    }

    pub fn global_variables(&self) -> BTreeMap<String, String> {
        self.shared.state().document.global_variables().clone()
    }

    /// Components declared by the current document, sorted
    pub fn component_names(&self) -> Vec<String> {
        self.shared
            .state()
            .document
            .component_names()
            .map(str::to_string)
            .collect()
    }

    /// Snapshot of the current document
    pub fn document(&self) -> Arc<ThemeDocument> {
        Arc::clone(&self.shared.state().document)
    }

    pub fn theme_dir(&self) -> &Path {
        &self.shared.theme_dir
    }

    pub fn document_path(&self) -> PathBuf {
        ThemeDocument::path_in(&self.shared.theme_dir)
    }

    pub fn registry(&self) -> &Arc<FileWatchRegistry> {
        &self.registry
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.state().shut_down
    }

    /// Stop watching, then release the document and every artifact.
    ///
    /// The registry goes first, so no reload can start afterwards. Safe to
    /// call repeatedly.
    pub fn shutdown(&self) {
        self.registry.shutdown();

        let mut state = self.shared.state();
        if state.shut_down {
            return;
        }
        state.shut_down = true;
        state.artifacts.clear();
        state.stale.clear();
        state.document = Arc::new(ThemeDocument::empty(self.shared.theme_dir.clone()));
        info!(path = %self.shared.theme_dir.display(), "theme manager shut down");
    }

    fn component_source(&self, component: &str) -> PathBuf {
        self.shared
            .state()
            .document
            .source_path(component)
            .unwrap_or_else(|| self.shared.theme_dir.join(format!("{component}.css")))
    }
}

impl<C: StyleCompiler> Drop for ThemeManager<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<C: StyleCompiler> std::fmt::Debug for ThemeManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeManager")
            .field("theme_dir", &self.shared.theme_dir)
            .field("components", &self.component_names())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str) -> ComponentArtifact<()> {
        ComponentArtifact::new(name.to_string(), String::new(), String::new(), ())
    }

    #[test]
    fn failure_without_artifact_stays_unloaded() {
        let mut state = ThemeState::<()>::new(ThemeDocument::empty("/theme"));
        state.mark_failed("panel");
        assert_eq!(state.component_state("panel"), ComponentState::Unloaded);
    }

    #[test]
    fn failure_after_success_is_stale_until_next_store() {
        let mut state = ThemeState::new(ThemeDocument::empty("/theme"));
        state.store(artifact("panel"));
        assert_eq!(state.component_state("panel"), ComponentState::Loaded);

        state.mark_failed("panel");
        assert_eq!(state.component_state("panel"), ComponentState::Stale);

        state.store(artifact("panel"));
        assert_eq!(state.component_state("panel"), ComponentState::Loaded);
    }
}
