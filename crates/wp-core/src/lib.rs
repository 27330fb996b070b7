//! Core state container for the waypoint workspace
//!
//! This crate provides the storage substrate the router is built on:
//! named state modules with atomic copy-on-write transitions, derived-value
//! selectors, substitutable side effects and a registry that snapshots every
//! module as JSON.

pub mod effect;
pub mod module;
pub mod registry;
pub mod selector;
pub mod subscriber;
pub mod transition;

use thiserror::Error;

// Re-export commonly used types
pub use effect::{Effect, SubstitutionGuard};
pub use module::{StateModule, SubscriptionId};
pub use registry::ModuleRegistry;
pub use selector::{Memoized, Selector};
pub use subscriber::StateSubscriber;
pub use transition::{Transition, TransitionContext};

/// Errors that can occur in state container operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),

    #[error("failed to serialize module '{module}': {source}")]
    Serialize {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}
