//! State subscriber trait

/// Trait for components that need to respond to state changes
///
/// UI bindings implement this to re-render from the latest snapshot. Modules
/// hold subscribers weakly, so dropping the last `Arc` unregisters them.
pub trait StateSubscriber<S>: Send + Sync {
    /// Called after a transition has published a new snapshot
    fn on_state_change(&self, module: &str, state: &S);
}
