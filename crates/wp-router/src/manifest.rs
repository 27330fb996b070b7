//! Declarative route manifests
//!
//! A manifest lists routes in registration order and refers to parents by
//! name, so a whole route forest can be kept in a JSON file:
//!
//! ```json
//! {
//!   "router": { "max_depth": 8 },
//!   "routes": [
//!     { "name": "org", "path": "/orgs/org:string" },
//!     { "name": "repo", "parent": "org", "path": "/repo:string", "query": "[&tab]",
//!       "defaults": { "tab": "code" } }
//!   ]
//! }
//! ```

use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RouterConfig;
use crate::params::ParameterValues;
use crate::route::{Route, RouteConfiguration, RouteId};
use crate::router::Router;
use crate::{Result, RouterError};

/// A route forest plus the configuration of the router that should own it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteManifest {
    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub routes: Vec<RouteDeclaration>,
}

/// One route of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDeclaration {
    pub name: String,

    /// Name of a route declared earlier in the same manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(default, skip_serializing_if = "ParameterValues::is_empty")]
    pub defaults: ParameterValues,
}

impl RouteManifest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Build a router from the manifest's configuration and register every route
    pub fn build(&self) -> Result<(Router, Vec<Route>)> {
        let router = Router::new(self.router.clone());
        let routes = self.register_all(&router)?;
        Ok((router, routes))
    }

    /// Register every declared route on `router`, in order.
    ///
    /// A parent name refers to the most recent earlier declaration with that
    /// name. Registration stops at the first failing route; routes registered
    /// before it stay registered.
    pub fn register_all(&self, router: &Router) -> Result<Vec<Route>> {
        let mut by_name: AHashMap<&str, RouteId> = AHashMap::new();
        let mut routes = Vec::with_capacity(self.routes.len());

        for declaration in &self.routes {
            let mut configuration = RouteConfiguration::new();
            if let Some(parent) = &declaration.parent {
                let parent_id = by_name.get(parent.as_str()).copied().ok_or_else(|| {
                    RouterError::Manifest(format!(
                        "route '{}' refers to undeclared parent '{}'",
                        declaration.name, parent
                    ))
                })?;
                configuration = configuration.parent(parent_id);
            }
            if let Some(path) = &declaration.path {
                configuration = configuration.path(path.clone());
            }
            if let Some(query) = &declaration.query {
                configuration = configuration.query(query.clone());
            }
            for (name, value) in &declaration.defaults {
                configuration = configuration.with_default(name.clone(), value.clone());
            }

            let route = router.add_route(&declaration.name, configuration)?;
            by_name.insert(declaration.name.as_str(), route.id());
            routes.push(route);
        }

        info!(routes = routes.len(), "registered route manifest");
        Ok(routes)
    }
}
