//! Named state modules

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use crate::selector::Selector;
use crate::subscriber::StateSubscriber;
use crate::transition::{Transition, TransitionContext};

/// Callback invoked with every newly published snapshot
pub type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Handle returned by [`StateModule::subscribe`], used to unsubscribe later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A named state value with atomic read-modify-write updates.
///
/// - `get()` returns the current snapshot (an `Arc` clone, no data copy).
/// - `update(f)` runs `f` against a lazily cloned draft while holding the
///   write lock, then publishes the draft as the next snapshot.
/// - `subscribe(listener)` is notified after each published change, outside
///   the lock, so listeners may read or update the module again.
///
/// Readers never observe a half-applied transition: a snapshot is replaced as
/// a whole or not at all.
pub struct StateModule<S> {
    name: String,
    state: RwLock<Arc<S>>,
    listeners: RwLock<Vec<(SubscriptionId, Listener<S>)>>,
    subscribers: RwLock<Vec<Weak<dyn StateSubscriber<S>>>>,
    next_id: AtomicU64,
}

impl<S> StateModule<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create a new module holding `initial`
    pub fn new(name: impl Into<String>, initial: S) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(Arc::new(initial)),
            listeners: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current snapshot
    pub fn get(&self) -> Arc<S> {
        Arc::clone(&self.state.read())
    }

    /// Evaluate a selector against the current snapshot
    pub fn select<T>(&self, selector: &impl Selector<S, T>) -> T {
        selector.select(&self.get())
    }

    /// Run one atomic transition and return whatever it returns.
    ///
    /// Subscribers are only notified when the transition touched the draft.
    pub fn update<R>(&self, transition: impl FnOnce(&mut TransitionContext<'_, S>) -> R) -> R {
        let (result, published) = {
            let mut current = self.state.write();
            let mut cx = TransitionContext::new(&**current);
            let result = transition(&mut cx);
            match cx.into_draft() {
                Some(draft) => {
                    let next = Arc::new(draft);
                    *current = Arc::clone(&next);
                    (result, Some(next))
                }
                None => (result, None),
            }
        };

        trace!(module = %self.name, changed = published.is_some(), "transition finished");
        if let Some(snapshot) = published {
            self.notify(&snapshot);
        }
        result
    }

    /// Apply a named transition as one atomic update
    pub fn apply(&self, transition: &Transition<S>) {
        self.update(|cx| cx.apply(transition));
    }

    /// Replace the whole state
    pub fn set(&self, state: S) {
        self.update(|cx| cx.replace(state));
    }

    /// Register a listener for published snapshots
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.write().retain(|(existing, _)| *existing != id);
    }

    /// Add a weakly held subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn StateSubscriber<S>>) {
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }

    /// Number of registered listeners and live subscribers
    pub fn subscriber_count(&self) -> usize {
        let live = self
            .subscribers
            .read()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count();
        self.listeners.read().len() + live
    }

    fn notify(&self, snapshot: &Arc<S>) {
        // Clone the tables so callbacks can subscribe or update re-entrantly
        let listeners: Vec<Listener<S>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }

        let subscribers: Vec<Arc<dyn StateSubscriber<S>>> = {
            let mut subscribers = self.subscribers.write();
            // Remove any dead weak references
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for subscriber in subscribers {
            subscriber.on_state_change(&self.name, snapshot);
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for StateModule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateModule")
            .field("name", &self.name)
            .field("state", &*self.state.read())
            .finish()
    }
}
