//! Navigation state machine
//!
//! The router is either idle or navigating. `begin` validates a navigation
//! synchronously and marks it as the newest request; the returned
//! [`NavigationRequest`] commits when it is awaited or settled, but only if no
//! newer request was accepted in the meantime. Every request it superseded
//! settles as [`NavigationOutcome::Cancelled`] and never sees its chain
//! committed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wp_core::StateModule;

use crate::params::ParameterValues;
use crate::registry::resolve_chain;
use crate::route::{RouteDescriptor, RouteId};
use crate::state::RouterState;
use crate::{Result, RouterError};

/// Terminal result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationOutcome {
    /// The navigation was committed
    Finished,
    /// A newer navigation superseded this one before it committed
    Cancelled,
}

pub const NAVIGATION_FINISHED: NavigationOutcome = NavigationOutcome::Finished;
pub const NAVIGATION_CANCELLED: NavigationOutcome = NavigationOutcome::Cancelled;

/// Arguments of a single navigation call
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    pub route: RouteId,
    pub parameters: ParameterValues,
}

/// A validated navigation waiting to be committed
#[derive(Debug)]
struct Plan {
    chain: Vec<RouteId>,
    values: BTreeMap<RouteId, ParameterValues>,
}

/// Resolve the chain of `route` and the parameters of every route on it.
///
/// Each navigation starts from scratch: every route takes its own defaults,
/// then the supplied values it declares. The leaf also takes every supplied
/// key no schema on the chain declares, so an undeclared key fails the leaf's
/// schema if it has one. Values that were active before are never carried
/// over.
fn plan_navigation(state: &RouterState, route: RouteId, supplied: &ParameterValues) -> Result<Plan> {
    if !state.contains(route) {
        return Err(RouterError::UnknownRoute(route));
    }

    let chain = resolve_chain(&state.routes, route)?;
    let descriptors = chain
        .iter()
        .map(|id| state.route(*id).ok_or(RouterError::UnknownRoute(*id)))
        .collect::<Result<Vec<_>>>()?;
    let claimed: BTreeSet<&str> = descriptors
        .iter()
        .filter_map(|descriptor| descriptor.schema.as_ref())
        .flat_map(|schema| schema.iter().map(|spec| spec.name.as_str()))
        .collect();

    let mut values = BTreeMap::new();
    for descriptor in descriptors {
        let is_leaf = descriptor.id == route;
        values.insert(
            descriptor.id,
            resolve_parameters(descriptor, supplied, is_leaf, &claimed)?,
        );
    }
    Ok(Plan { chain, values })
}

fn resolve_parameters(
    descriptor: &RouteDescriptor,
    supplied: &ParameterValues,
    is_leaf: bool,
    claimed: &BTreeSet<&str>,
) -> Result<ParameterValues> {
    let mut values = descriptor.parameter_defaults.clone();
    for (name, value) in supplied {
        let declared = descriptor
            .schema
            .as_ref()
            .is_some_and(|schema| schema.declares(name));
        let accepted = declared || (is_leaf && !claimed.contains(name.as_str()));
        if accepted {
            values.insert(name.clone(), value.clone());
        }
    }

    if let Some(schema) = &descriptor.schema {
        schema.validate(descriptor.id, &values)?;
    }
    Ok(values)
}

/// Validate a navigation and enter the navigating state.
///
/// Fails without touching the state when the route is unknown, the forest is
/// malformed or a parameter is invalid.
pub(crate) fn begin(
    module: &Arc<StateModule<RouterState>>,
    navigation: Navigation,
) -> Result<NavigationRequest> {
    let Navigation { route, parameters } = navigation;

    let (sequence, plan, superseded) = module.update(|cx| {
        let plan = plan_navigation(cx.state(), route, &parameters)?;
        let state = cx.state_mut();
        let superseded = state.navigation_is_in_progress;
        state.latest_request += 1;
        state.navigation_is_in_progress = true;
        Ok::<_, RouterError>((state.latest_request, plan, superseded))
    })?;

    debug!(
        route = %route,
        sequence,
        superseded,
        chain = ?plan.chain,
        "navigation started"
    );
    Ok(NavigationRequest {
        route: Some(route),
        status: Status::Pending {
            module: Arc::clone(module),
            sequence,
            plan,
        },
    })
}

/// Commit `plan` if `sequence` is still the newest request
fn commit(module: &StateModule<RouterState>, sequence: u64, plan: Plan) -> NavigationOutcome {
    let outcome = module.update(|cx| {
        if cx.state().latest_request != sequence {
            return NavigationOutcome::Cancelled;
        }
        let state = cx.state_mut();
        state.active_route_ids = Some(plan.chain);
        state.active_route_parameter_values = plan.values;
        state.navigation_is_in_progress = false;
        NavigationOutcome::Finished
    });

    debug!(sequence, ?outcome, "navigation settled");
    outcome
}

enum Status {
    Pending {
        module: Arc<StateModule<RouterState>>,
        sequence: u64,
        plan: Plan,
    },
    Settled(NavigationOutcome),
}

/// An accepted navigation that has not necessarily settled yet.
///
/// Awaiting the request (or calling [`settle`](Self::settle)) commits it when
/// it is still the newest one and yields the outcome. Once settled, no further
/// state change from this navigation is pending. Dropping the newest request
/// unsettled leaves the active chain alone and clears
/// `navigation_is_in_progress`.
#[must_use = "a navigation only commits once it is awaited or settled"]
pub struct NavigationRequest {
    route: Option<RouteId>,
    status: Status,
}

impl NavigationRequest {
    /// A request that is already settled with `outcome`
    pub fn settled(outcome: NavigationOutcome) -> Self {
        Self {
            route: None,
            status: Status::Settled(outcome),
        }
    }

    /// Target route, if the request came from the state machine
    pub fn route(&self) -> Option<RouteId> {
        self.route
    }

    pub fn outcome(&self) -> Option<NavigationOutcome> {
        match self.status {
            Status::Settled(outcome) => Some(outcome),
            Status::Pending { .. } => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.outcome().is_some()
    }

    /// Commit or cancel now and return the outcome. Idempotent.
    pub fn settle(&mut self) -> NavigationOutcome {
        let status = std::mem::replace(
            &mut self.status,
            Status::Settled(NavigationOutcome::Cancelled),
        );
        let outcome = match status {
            Status::Settled(outcome) => outcome,
            Status::Pending {
                module,
                sequence,
                plan,
            } => commit(&module, sequence, plan),
        };
        self.status = Status::Settled(outcome);
        outcome
    }
}

impl Future for NavigationRequest {
    type Output = NavigationOutcome;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        Poll::Ready(self.get_mut().settle())
    }
}

impl Drop for NavigationRequest {
    fn drop(&mut self) {
        if let Status::Pending {
            module, sequence, ..
        } = &self.status
        {
            let sequence = *sequence;
            let abandoned = module.update(|cx| {
                let state = cx.state();
                if state.latest_request == sequence && state.navigation_is_in_progress {
                    cx.state_mut().navigation_is_in_progress = false;
                    true
                } else {
                    false
                }
            });
            if abandoned {
                warn!(route = ?self.route, sequence, "navigation request dropped before settling");
            }
        }
    }
}

impl fmt::Debug for NavigationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationRequest")
            .field("route", &self.route)
            .field("outcome", &self.outcome())
            .finish()
    }
}
