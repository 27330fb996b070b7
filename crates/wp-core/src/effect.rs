//! Side-effect wrappers with test-time substitution

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

type EffectFn<I, O> = Arc<dyn Fn(I) -> O + Send + Sync>;
/// Active substitutions, newest last, keyed by the id of their guard
type Slot<I, O> = Arc<RwLock<Vec<(u64, EffectFn<I, O>)>>>;

/// A named function whose implementation can be swapped out in tests.
///
/// Each effect owns its own substitution slot, so swapping one never affects
/// another. [`substitute`](Self::substitute) returns a guard that withdraws
/// its replacement when dropped. The newest live substitution is the one
/// called, whatever order the guards are dropped in.
pub struct Effect<I, O> {
    name: String,
    original: EffectFn<I, O>,
    substitutes: Slot<I, O>,
    next_guard: AtomicU64,
}

impl<I, O> Effect<I, O> {
    pub fn new<F>(name: impl Into<String>, original: F) -> Self
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            original: Arc::new(original),
            substitutes: Arc::new(RwLock::new(Vec::new())),
            next_guard: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the current implementation
    pub fn call(&self, input: I) -> O {
        // Release the lock before calling so the implementation may re-enter
        let current = self
            .substitutes
            .read()
            .last()
            .map(|(_, replacement)| Arc::clone(replacement))
            .unwrap_or_else(|| Arc::clone(&self.original));
        current(input)
    }

    /// Replace the implementation until the returned guard is dropped
    #[must_use = "the substitution is reverted as soon as the guard is dropped"]
    pub fn substitute<F>(&self, replacement: F) -> SubstitutionGuard<I, O>
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        let id = self.next_guard.fetch_add(1, Ordering::Relaxed);
        debug!(effect = %self.name, guard = id, "substituting effect");
        self.substitutes.write().push((id, Arc::new(replacement)));
        SubstitutionGuard {
            name: self.name.clone(),
            slot: Arc::clone(&self.substitutes),
            id,
        }
    }

    pub fn is_substituted(&self) -> bool {
        !self.substitutes.read().is_empty()
    }

    /// Drop any substitution and go back to the wrapped function
    pub fn reset(&self) {
        self.substitutes.write().clear();
    }
}

impl<I, O> fmt::Debug for Effect<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.name)
            .field("substituted", &self.is_substituted())
            .finish()
    }
}

/// Withdraws one substitution from its effect on drop
pub struct SubstitutionGuard<I, O> {
    name: String,
    slot: Slot<I, O>,
    id: u64,
}

impl<I, O> Drop for SubstitutionGuard<I, O> {
    fn drop(&mut self) {
        debug!(effect = %self.name, guard = self.id, "withdrawing substitution");
        // Already gone after `Effect::reset`
        self.slot.write().retain(|(id, _)| *id != self.id);
    }
}
