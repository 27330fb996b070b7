//! Pure state transitions and the context they run in

use std::fmt;
use std::sync::Arc;

use tracing::trace;

type TransitionFn<S> = Arc<dyn Fn(&mut TransitionContext<'_, S>) + Send + Sync>;

/// A named, pure state transition.
///
/// Transitions only ever touch the draft handed to them through a
/// [`TransitionContext`]; publishing the result is the module's job.
pub struct Transition<S> {
    name: String,
    apply: TransitionFn<S>,
}

impl<S> Transition<S> {
    /// Create a new named transition
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&mut TransitionContext<'_, S>) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S> Clone for Transition<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            apply: Arc::clone(&self.apply),
        }
    }
}

impl<S> fmt::Debug for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .finish()
    }
}

/// The in-flight state of one atomic module update.
///
/// The draft is cloned from the published snapshot on the first call to
/// [`state_mut`](Self::state_mut); a transition that only reads leaves the
/// module untouched. Nested transitions applied through
/// [`apply`](Self::apply) work on the same draft, and `depth` tracks how deep
/// the nesting currently is. The context is borrowed mutably for the whole
/// update, so the counter never needs a lock.
pub struct TransitionContext<'a, S> {
    base: &'a S,
    draft: Option<S>,
    depth: u32,
}

impl<'a, S: Clone> TransitionContext<'a, S> {
    pub(crate) fn new(base: &'a S) -> Self {
        Self {
            base,
            draft: None,
            depth: 0,
        }
    }

    /// Current view of the state, including changes made so far
    pub fn state(&self) -> &S {
        self.draft.as_ref().unwrap_or(self.base)
    }

    /// Mutable access to the draft, cloning the snapshot on first use
    pub fn state_mut(&mut self) -> &mut S {
        self.draft.get_or_insert_with(|| self.base.clone())
    }

    /// Replace the whole draft without cloning the snapshot first
    pub fn replace(&mut self, state: S) {
        self.draft = Some(state);
    }

    /// Apply a nested transition directly to this draft
    pub fn apply(&mut self, transition: &Transition<S>) {
        self.depth += 1;
        trace!(transition = %transition.name, depth = self.depth, "applying transition");
        (transition.apply)(self);
        self.depth -= 1;
    }

    /// Number of transitions currently being applied on this context
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether a transition is currently running inside another one
    pub fn is_nested(&self) -> bool {
        self.depth > 1
    }

    /// Whether the draft differs from the published snapshot
    pub fn is_dirty(&self) -> bool {
        self.draft.is_some()
    }

    pub(crate) fn into_draft(self) -> Option<S> {
        self.draft
    }
}
