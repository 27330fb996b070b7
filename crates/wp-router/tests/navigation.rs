use std::sync::{Arc, Mutex};

use wp_core::StateSubscriber;
use wp_router::selectors;
use wp_router::{
    parameters, NavigationOutcome, NavigationRequest, ParameterValues, Route, RouteConfiguration,
    RouteId, Router, RouterError, RouterState, NAVIGATION_CANCELLED, NAVIGATION_FINISHED,
};

// ============================================================================
// Fixtures
// ============================================================================

/// org -> repo -> file, plus a settings page under org and a detached help page
struct Forest {
    router: Router,
    org: Route,
    repo: Route,
    file: Route,
    settings: Route,
    help: Route,
}

fn forest() -> Forest {
    let router = Router::default();
    let org = router
        .add_route("org", RouteConfiguration::new().path("/orgs/org:string"))
        .unwrap();
    let repo = router
        .add_route(
            "repo",
            RouteConfiguration::new()
                .parent(&org)
                .path("/repo:string")
                .query("[&tab]")
                .with_default("tab", "code"),
        )
        .unwrap();
    let file = router
        .add_route(
            "file",
            RouteConfiguration::new()
                .parent(&repo)
                .path("/blob/path:string")
                .query("[&line:number]"),
        )
        .unwrap();
    let settings = router
        .add_route("settings", RouteConfiguration::new().parent(&org))
        .unwrap();
    let help = router.add_route("help", RouteConfiguration::new()).unwrap();

    Forest {
        router,
        org,
        repo,
        file,
        settings,
        help,
    }
}

/// While idle, the active chain and the parameter table describe the same routes
fn assert_consistent(state: &RouterState) {
    assert!(!state.navigation_is_in_progress);
    let chain = selectors::active_chain(state);
    for descriptor in &state.routes {
        let on_chain = chain.contains(&descriptor.id);
        assert_eq!(selectors::is_active(state, descriptor.id).unwrap(), on_chain);
        assert_eq!(
            state.active_route_parameter_values.contains_key(&descriptor.id),
            on_chain,
            "route {}",
            descriptor.id
        );
    }
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_route_ids_are_dense_and_monotonic() {
    let f = forest();
    let ids: Vec<RouteId> = [&f.org, &f.repo, &f.file, &f.settings, &f.help]
        .iter()
        .map(|route| route.id())
        .collect();
    assert_eq!(ids, (0..5).map(RouteId).collect::<Vec<_>>());
    assert_eq!(f.router.state().routes.len(), 5);
}

#[test]
fn test_failed_registration_leaves_state_unchanged() {
    let f = forest();
    let before = f.router.state();

    let err = f
        .router
        .add_route("broken", RouteConfiguration::new().parent(RouteId(42)))
        .unwrap_err();
    assert!(matches!(err, RouterError::MalformedRouteForest { .. }));
    assert!(Arc::ptr_eq(&before, &f.router.state()));
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_navigation_activates_whole_chain() {
    let f = forest();
    let outcome = f
        .file
        .navigate_to(parameters! {
            "org" => "acme",
            "repo" => "rocket",
            "path" => "src/main.rs",
            "line" => 12,
        })
        .unwrap()
        .await;
    assert_eq!(outcome, NAVIGATION_FINISHED);

    let state = f.router.state();
    assert_eq!(
        selectors::active_chain(&state),
        &[f.org.id(), f.repo.id(), f.file.id()]
    );
    assert_eq!(selectors::active_leaf(&state), Some(f.file.id()));
    assert!(f.org.is_active() && f.repo.is_active() && f.file.is_active());
    assert!(!f.settings.is_active() && !f.help.is_active());
    assert_consistent(&state);

    assert_eq!(f.org.parameter_values().unwrap(), parameters! { "org" => "acme" });
    assert_eq!(
        f.repo.parameter_values().unwrap(),
        parameters! { "repo" => "rocket", "tab" => "code" }
    );
    assert_eq!(
        f.file.effective_parameter_values().unwrap(),
        parameters! {
            "org" => "acme",
            "repo" => "rocket",
            "tab" => "code",
            "path" => "src/main.rs",
            "line" => 12,
        }
    );
}

#[tokio::test]
async fn test_last_navigation_wins() {
    let f = forest();
    let first = f.router.navigate_to(f.help.id(), parameters! {}).unwrap();
    let second = f
        .settings
        .navigate_to(parameters! { "org" => "acme" })
        .unwrap();
    assert!(f.router.is_navigating());

    let (first, second) = tokio::join!(first, second);
    assert_eq!(first, NAVIGATION_CANCELLED);
    assert_eq!(second, NAVIGATION_FINISHED);

    let state = f.router.state();
    assert_eq!(selectors::active_leaf(&state), Some(f.settings.id()));
    assert_consistent(&state);
}

#[tokio::test]
async fn test_awaiting_in_reverse_order_still_cancels_older_request() {
    let f = forest();
    let older = f.help.navigate_to(parameters! {}).unwrap();
    let newer = f.org.navigate_to(parameters! { "org" => "acme" }).unwrap();

    assert_eq!(newer.await, NavigationOutcome::Finished);
    assert_eq!(older.await, NavigationOutcome::Cancelled);
    assert_eq!(selectors::active_leaf(&f.router.state()), Some(f.org.id()));
}

#[tokio::test]
async fn test_requests_settle_on_other_tasks() {
    let f = forest();
    let older = f.help.navigate_to(parameters! {}).unwrap();
    let newer = f.org.navigate_to(parameters! { "org" => "initech" }).unwrap();

    let older = tokio::spawn(older);
    let newer = tokio::spawn(newer);
    assert_eq!(older.await.unwrap(), NAVIGATION_CANCELLED);
    assert_eq!(newer.await.unwrap(), NAVIGATION_FINISHED);
    assert_eq!(f.org.parameter_values().unwrap(), parameters! { "org" => "initech" });
}

#[tokio::test]
async fn test_renavigation_is_idempotent() {
    let f = forest();
    let params = parameters! { "org" => "acme", "repo" => "rocket", "tab" => "issues" };

    f.repo.navigate_to(params.clone()).unwrap().await;
    let first = f.router.state();
    f.repo.navigate_to(params).unwrap().await;
    let second = f.router.state();

    assert_eq!(first.active_route_ids, second.active_route_ids);
    assert_eq!(
        first.active_route_parameter_values,
        second.active_route_parameter_values
    );
}

#[tokio::test]
async fn test_parameters_are_resolved_from_scratch() {
    let f = forest();
    f.repo
        .navigate_to(parameters! { "org" => "acme", "repo" => "rocket", "tab" => "issues" })
        .unwrap()
        .await;
    f.repo
        .navigate_to(parameters! { "org" => "acme", "repo" => "rocket" })
        .unwrap()
        .await;

    // The tab falls back to its default instead of keeping the previous value
    assert_eq!(
        f.repo.parameter_values().unwrap(),
        parameters! { "repo" => "rocket", "tab" => "code" }
    );
}

#[tokio::test]
async fn test_inactive_routes_have_no_parameter_values() {
    let f = forest();
    assert!(matches!(
        f.org.parameter_values(),
        Err(RouterError::RouteNotActive(_))
    ));

    f.help.navigate_to(parameters! {}).unwrap().await;
    assert_eq!(f.help.parameter_values().unwrap(), ParameterValues::new());
    assert!(matches!(
        f.org.parameter_values(),
        Err(RouterError::RouteNotActive(_))
    ));
    assert!(matches!(
        f.file.effective_parameter_values(),
        Err(RouterError::RouteNotActive(_))
    ));
}

// ============================================================================
// Rejected navigations
// ============================================================================

#[tokio::test]
async fn test_unknown_route_is_rejected_without_state_change() {
    let f = forest();
    f.help.navigate_to(parameters! {}).unwrap().await;
    let before = f.router.state();

    let err = f.router.navigate_to(RouteId(99), parameters! {}).unwrap_err();
    assert!(matches!(err, RouterError::UnknownRoute(RouteId(99))));
    assert!(Arc::ptr_eq(&before, &f.router.state()));
}

#[tokio::test]
async fn test_invalid_parameters_are_rejected_without_state_change() {
    let f = forest();
    let before = f.router.state();

    let missing = f.repo.navigate_to(parameters! { "org" => "acme" }).unwrap_err();
    assert!(matches!(missing, RouterError::MissingParameter { ref name, .. } if name == "repo"));

    let wrong_kind = f
        .file
        .navigate_to(parameters! {
            "org" => "acme",
            "repo" => "rocket",
            "path" => "README.md",
            "line" => "twelve",
        })
        .unwrap_err();
    assert!(matches!(wrong_kind, RouterError::ParameterKind { ref name, .. } if name == "line"));

    let stray = f
        .org
        .navigate_to(parameters! { "org" => "acme", "page" => 2 })
        .unwrap_err();
    assert!(matches!(stray, RouterError::UnexpectedParameter { ref name, .. } if name == "page"));

    assert!(Arc::ptr_eq(&before, &f.router.state()));
    assert!(!f.router.is_navigating());
}

#[tokio::test]
async fn test_rejected_navigation_does_not_cancel_pending_one() {
    let f = forest();
    let pending = f.help.navigate_to(parameters! {}).unwrap();
    assert!(f.repo.navigate_to(parameters! {}).is_err());

    assert_eq!(pending.await, NAVIGATION_FINISHED);
    assert_eq!(selectors::active_leaf(&f.router.state()), Some(f.help.id()));
}

#[tokio::test]
async fn test_dropped_request_does_not_leave_router_navigating() {
    let f = forest();
    f.help.navigate_to(parameters! {}).unwrap().await;

    let request = f.org.navigate_to(parameters! { "org" => "acme" }).unwrap();
    assert!(f.router.is_navigating());
    drop(request);

    let state = f.router.state();
    assert_eq!(selectors::active_leaf(&state), Some(f.help.id()));
    assert_consistent(&state);
}

#[tokio::test]
async fn test_snapshots_cannot_write_router_state() {
    let f = forest();
    let pending = f.help.navigate_to(parameters! {}).unwrap();

    // A snapshot is shared and immutable; editing a copy never reaches the router
    let mut copy = RouterState::clone(&f.router.state());
    copy.navigation_is_in_progress = false;
    copy.active_route_ids = Some(vec![f.org.id()]);
    copy.active_route_parameter_values.clear();

    assert!(f.router.is_navigating());
    assert!(!f.org.is_active());
    assert_eq!(selectors::active_chain(&f.router.state()), &[] as &[RouteId]);

    assert_eq!(pending.await, NAVIGATION_FINISHED);
    let state = f.router.state();
    assert_eq!(selectors::active_leaf(&state), Some(f.help.id()));
    assert_consistent(&state);
}

// ============================================================================
// Observation and substitution
// ============================================================================

struct Recorder {
    leaves: Mutex<Vec<Option<RouteId>>>,
}

impl StateSubscriber<RouterState> for Recorder {
    fn on_state_change(&self, _module: &str, state: &RouterState) {
        if !state.navigation_is_in_progress {
            self.leaves.lock().unwrap().push(selectors::active_leaf(state));
        }
    }
}

#[tokio::test]
async fn test_subscribers_observe_committed_chains() {
    let f = forest();
    let recorder = Arc::new(Recorder {
        leaves: Mutex::new(Vec::new()),
    });
    f.router.add_subscriber(recorder.clone());

    let cancelled = f.help.navigate_to(parameters! {}).unwrap();
    let finished = f.org.navigate_to(parameters! { "org" => "acme" }).unwrap();
    let _ = tokio::join!(cancelled, finished);

    // The cancelled navigation never published its chain
    assert_eq!(*recorder.leaves.lock().unwrap(), vec![Some(f.org.id())]);

    drop(recorder);
    f.help.navigate_to(parameters! {}).unwrap().await;
}

#[tokio::test]
async fn test_navigation_effect_can_be_substituted() {
    let f = forest();
    let calls = Arc::new(Mutex::new(Vec::new()));

    {
        let seen = Arc::clone(&calls);
        let _guard = f.router.navigation().substitute(move |navigation| {
            seen.lock().unwrap().push(navigation.route);
            Ok(NavigationRequest::settled(NAVIGATION_CANCELLED))
        });

        let outcome = f.help.navigate_to(parameters! {}).unwrap().await;
        assert_eq!(outcome, NAVIGATION_CANCELLED);
        assert!(!f.router.is_navigating());
        assert!(selectors::active_chain(&f.router.state()).is_empty());
    }

    assert_eq!(*calls.lock().unwrap(), vec![f.help.id()]);
    assert!(!f.router.navigation().is_substituted());
    assert_eq!(
        f.help.navigate_to(parameters! {}).unwrap().await,
        NAVIGATION_FINISHED
    );
}
