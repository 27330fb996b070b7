//! Hierarchical navigation state machine built on the waypoint state container
//!
//! Routes form a forest registered once at startup. Navigating to a route
//! activates its whole ancestor chain, validates every route's parameters and
//! commits the result as a single transition on the `router` state module.
//! Overlapping navigations are sequenced so that the newest one wins and every
//! request it superseded settles as [`NavigationOutcome::Cancelled`].

pub mod config;
pub mod manifest;
pub mod navigation;
pub mod params;
pub mod registry;
pub mod route;
pub mod router;
pub mod selectors;
pub mod state;
pub mod template;

use thiserror::Error;

// Re-exports
pub use config::RouterConfig;
pub use manifest::{RouteDeclaration, RouteManifest};
pub use navigation::{
    Navigation, NavigationOutcome, NavigationRequest, NAVIGATION_CANCELLED, NAVIGATION_FINISHED,
};
pub use params::{ParameterKind, ParameterSchema, ParameterSpec, ParameterValue, ParameterValues};
pub use route::{Route, RouteConfiguration, RouteDescriptor, RouteId};
pub use router::Router;
pub use state::RouterState;
pub use template::TemplateError;

/// Errors that can occur in router operations
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("route {0} is not registered")]
    UnknownRoute(RouteId),

    #[error("route {0} is not active")]
    RouteNotActive(RouteId),

    #[error("malformed route forest at route {route}: {reason}")]
    MalformedRouteForest { route: RouteId, reason: String },

    #[error("invalid parameter template: {0}")]
    InvalidTemplate(#[from] TemplateError),

    #[error("invalid default '{name}' for route {route}: {reason}")]
    InvalidDefault {
        route: RouteId,
        name: String,
        reason: String,
    },

    #[error("route {route} requires parameter '{name}'")]
    MissingParameter { route: RouteId, name: String },

    #[error("route {route} does not declare parameter '{name}'")]
    UnexpectedParameter { route: RouteId, name: String },

    #[error("parameter '{name}' of route {route} must be a {expected}, got a {found}")]
    ParameterKind {
        route: RouteId,
        name: String,
        expected: ParameterKind,
        found: ParameterKind,
    },

    #[error("route manifest error: {0}")]
    Manifest(String),

    #[error("state container error: {0}")]
    Store(#[from] wp_core::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = RouterError> = std::result::Result<T, E>;
