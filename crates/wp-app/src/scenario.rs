//! Scripted navigation scenarios
//!
//! A scenario is a route manifest plus a list of steps. All navigations of a
//! step are issued before any of them is awaited, so a step with several
//! navigations shows the newest one winning.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wp_core::StateSubscriber;
use wp_router::selectors;
use wp_router::{NavigationOutcome, ParameterValues, RouteManifest, Router, RouterState};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(flatten)]
    pub manifest: RouteManifest,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Navigations issued together
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct Step {
    pub navigations: Vec<ScriptedNavigation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedNavigation {
    /// Route name; the latest route registered under it is used
    pub route: String,

    #[serde(default)]
    pub parameters: ParameterValues,
}

/// What happened to one scripted navigation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Settled(NavigationOutcome),
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub outcomes: Vec<StepOutcome>,

    /// Names of the active chain once the step has settled, root first
    pub active: Vec<String>,
}

impl Scenario {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }
}

/// Logs every published router snapshot
struct TransitionLogger;

impl StateSubscriber<RouterState> for TransitionLogger {
    fn on_state_change(&self, module: &str, state: &RouterState) {
        info!(
            module,
            navigating = state.navigation_is_in_progress,
            chain = ?selectors::active_chain(state),
            "router state changed"
        );
    }
}

/// Register the scenario's routes on a fresh router and play every step
pub async fn run(scenario: &Scenario) -> Result<Vec<StepReport>> {
    let (router, routes) = scenario
        .manifest
        .build()
        .context("failed to register routes")?;
    info!(routes = routes.len(), steps = scenario.steps.len(), "scenario loaded");

    let logger: Arc<dyn StateSubscriber<RouterState>> = Arc::new(TransitionLogger);
    router.add_subscriber(Arc::clone(&logger));

    let mut reports = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let mut issued = Vec::with_capacity(step.navigations.len());
        for navigation in &step.navigations {
            let route = router
                .routes_named(&navigation.route)
                .pop()
                .with_context(|| format!("step {}: no route named '{}'", index, navigation.route))?;
            issued.push(route.navigate_to(navigation.parameters.clone()));
        }

        let mut outcomes = Vec::with_capacity(issued.len());
        for (navigation, request) in step.navigations.iter().zip(issued) {
            let outcome = match request {
                Ok(request) => StepOutcome::Settled(request.await),
                Err(err) => {
                    warn!(step = index, route = %navigation.route, "navigation rejected: {}", err);
                    StepOutcome::Rejected(err.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let active = active_names(&router);
        info!(step = index, ?outcomes, ?active, "step settled");
        reports.push(StepReport { outcomes, active });
    }

    Ok(reports)
}

fn active_names(router: &Router) -> Vec<String> {
    let state = router.state();
    selectors::active_chain(&state)
        .iter()
        .filter_map(|id| state.route(*id))
        .map(|descriptor| descriptor.name.clone())
        .collect()
}
