//! Derived-value selectors

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// A pure function deriving a value from a state snapshot.
///
/// Any `Fn(&S) -> T` is a selector. Because selectors take the snapshot as an
/// argument they work equally against a module's live state and against a
/// snapshot captured earlier.
pub trait Selector<S, T> {
    fn select(&self, state: &S) -> T;
}

impl<S, T, F> Selector<S, T> for F
where
    F: Fn(&S) -> T,
{
    fn select(&self, state: &S) -> T {
        self(state)
    }
}

/// Selector wrapper that caches its last result per snapshot.
///
/// Snapshots are compared by identity, so the cached value is reused until a
/// transition publishes a new snapshot.
pub struct Memoized<S, T, F> {
    selector: F,
    cache: Mutex<Option<(Weak<S>, T)>>,
}

impl<S, T, F> Memoized<S, T, F>
where
    T: Clone,
    F: Selector<S, T>,
{
    pub fn new(selector: F) -> Self {
        Self {
            selector,
            cache: Mutex::new(None),
        }
    }

    /// Derived value for `snapshot`, computed at most once per snapshot
    pub fn get(&self, snapshot: &Arc<S>) -> T {
        let key = Arc::downgrade(snapshot);
        let mut cache = self.cache.lock();
        if let Some((cached, value)) = cache.as_ref() {
            if Weak::ptr_eq(cached, &key) {
                return value.clone();
            }
        }

        let value = self.selector.select(snapshot);
        *cache = Some((key, value.clone()));
        value
    }

    /// Forget the cached value
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }
}
