//! State owned by the router module

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::ParameterValues;
use crate::route::{RouteDescriptor, RouteId};

/// The single state value of the `router` module.
///
/// Only the route registry and the navigation state machine write it. While
/// `navigation_is_in_progress` is false, `active_route_ids` and
/// `active_route_parameter_values` describe the same chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterState {
    /// Registered routes, indexed by id
    pub routes: Vec<RouteDescriptor>,

    /// Active chain, root first; `None` until the first navigation finishes
    pub active_route_ids: Option<Vec<RouteId>>,

    /// Resolved parameters of every route on the active chain
    pub active_route_parameter_values: BTreeMap<RouteId, ParameterValues>,

    /// True while a navigation has been accepted but not yet settled
    pub navigation_is_in_progress: bool,

    /// Sequence number of the newest accepted navigation request
    #[serde(skip)]
    pub(crate) latest_request: u64,
}

impl RouterState {
    pub fn route(&self, id: RouteId) -> Option<&RouteDescriptor> {
        self.routes.get(id.index())
    }

    pub fn contains(&self, id: RouteId) -> bool {
        id.index() < self.routes.len()
    }
}
