/// A component's stylesheet at one point in time
///
/// Artifacts are immutable. Every successful reload builds a new one and
/// swaps it in, so a handle obtained earlier stays valid and unchanged.
#[derive(Debug)]
pub struct ComponentArtifact<H> {
    component: String,
    raw_text: String,
    resolved_text: String,
    compiled: H,
}

impl<H> ComponentArtifact<H> {
    pub(crate) fn new(
        component: String,
        raw_text: String,
        resolved_text: String,
        compiled: H,
    ) -> Self {
        Self {
            component,
            raw_text,
            resolved_text,
            compiled,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Stylesheet text as read from disk
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Stylesheet text with every variable reference substituted
    pub fn resolved_text(&self) -> &str {
        &self.resolved_text
    }

    /// Handle produced by the injected compiler
    pub fn compiled(&self) -> &H {
        &self.compiled
    }
}

/// Lifecycle of a component's artifact
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentState {
    /// No artifact (never resolved, undeclared, or the manager shut down)
    Unloaded,
    /// The artifact reflects the last reload
    Loaded,
    /// The last reload failed; the previous artifact is still served
    Stale,
}
