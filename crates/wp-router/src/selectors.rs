//! Active-route selectors
//!
//! Pure queries over a [`RouterState`] snapshot. They never read the live
//! router, so the same functions answer questions about the current state and
//! about any snapshot captured earlier.

use crate::params::ParameterValues;
use crate::route::RouteId;
use crate::state::RouterState;
use crate::{Result, RouterError};

/// Active chain, root first; empty before the first finished navigation
pub fn active_chain(state: &RouterState) -> &[RouteId] {
    state.active_route_ids.as_deref().unwrap_or(&[])
}

/// Deepest route of the active chain
pub fn active_leaf(state: &RouterState) -> Option<RouteId> {
    active_chain(state).last().copied()
}

/// Whether `route` is on the active chain
pub fn is_active(state: &RouterState, route: RouteId) -> Result<bool> {
    ensure_registered(state, route)?;
    Ok(active_chain(state).contains(&route))
}

/// Parameter values `route` was activated with.
///
/// Fails with [`RouterError::RouteNotActive`] instead of falling back to
/// defaults when the route is not on the active chain.
pub fn parameter_values(state: &RouterState, route: RouteId) -> Result<ParameterValues> {
    ensure_registered(state, route)?;
    if !active_chain(state).contains(&route) {
        return Err(RouterError::RouteNotActive(route));
    }
    state
        .active_route_parameter_values
        .get(&route)
        .cloned()
        .ok_or(RouterError::RouteNotActive(route))
}

/// Values of every active route from the root down to `route`, merged so that
/// a descendant's value wins over an ancestor's value with the same name
pub fn effective_parameter_values(state: &RouterState, route: RouteId) -> Result<ParameterValues> {
    ensure_registered(state, route)?;
    let chain = active_chain(state);
    let depth = chain
        .iter()
        .position(|id| *id == route)
        .ok_or(RouterError::RouteNotActive(route))?;

    let mut merged = ParameterValues::new();
    for id in &chain[..=depth] {
        if let Some(values) = state.active_route_parameter_values.get(id) {
            merged.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    Ok(merged)
}

fn ensure_registered(state: &RouterState, route: RouteId) -> Result<()> {
    if state.contains(route) {
        Ok(())
    } else {
        Err(RouterError::UnknownRoute(route))
    }
}
