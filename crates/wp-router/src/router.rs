//! Router handle

use std::fmt;
use std::sync::Arc;

use wp_core::{Effect, ModuleRegistry, Selector, StateModule, StateSubscriber, SubscriptionId};

use crate::config::RouterConfig;
use crate::navigation::{self, Navigation, NavigationRequest};
use crate::params::ParameterValues;
use crate::registry;
use crate::route::{Route, RouteConfiguration, RouteDescriptor, RouteId};
use crate::state::RouterState;
use crate::{Result, RouterError};

/// Cheaply cloneable handle to one router and its state module.
///
/// All clones share the same state; routes registered through one clone are
/// visible through every other. Only the registry and the navigation state
/// machine write that state; callers read snapshots and subscribe.
///
/// ```compile_fail
/// let router = wp_router::Router::default();
/// router.module().set(wp_router::RouterState::default());
/// ```
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    config: RouterConfig,
    module: Arc<StateModule<RouterState>>,
    navigation: Effect<Navigation, Result<NavigationRequest>>,
}

impl Router {
    /// Create a router with a standalone state module
    pub fn new(config: RouterConfig) -> Self {
        let module = Arc::new(StateModule::new(
            config.module_name.clone(),
            RouterState::default(),
        ));
        Self::from_module(config, module)
    }

    /// Create a router whose state module is registered in `registry`
    pub fn with_registry(config: RouterConfig, registry: &ModuleRegistry) -> Result<Self> {
        let module = registry.create(&config.module_name, RouterState::default())?;
        Ok(Self::from_module(config, module))
    }

    fn from_module(config: RouterConfig, module: Arc<StateModule<RouterState>>) -> Self {
        let navigation = {
            let module = Arc::clone(&module);
            Effect::new("navigate_to", move |request: Navigation| {
                navigation::begin(&module, request)
            })
        };
        Self {
            inner: Arc::new(RouterInner {
                config,
                module,
                navigation,
            }),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    /// The state module backing this router
    pub(crate) fn module(&self) -> &Arc<StateModule<RouterState>> {
        &self.inner.module
    }

    /// Current router snapshot
    pub fn state(&self) -> Arc<RouterState> {
        self.module().get()
    }

    pub fn select<T>(&self, selector: &impl Selector<RouterState, T>) -> T {
        self.inner.module.select(selector)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RouterState) + Send + Sync + 'static,
    {
        self.inner.module.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.module.unsubscribe(id);
    }

    pub fn add_subscriber(&self, subscriber: Arc<dyn StateSubscriber<RouterState>>) {
        self.inner.module.add_subscriber(subscriber);
    }

    /// Register a route and return a handle to it.
    ///
    /// Ids are assigned in registration order starting at zero. Names need not
    /// be unique.
    pub fn add_route(&self, name: &str, configuration: RouteConfiguration) -> Result<Route> {
        let descriptor =
            registry::register_route(self.module(), &self.inner.config, name, configuration)?;
        Ok(Route::new(descriptor.id, descriptor.name, self.clone()))
    }

    /// Handle to an already registered route
    pub fn route(&self, id: RouteId) -> Result<Route> {
        let descriptor = self.descriptor(id)?;
        Ok(Route::new(descriptor.id, descriptor.name, self.clone()))
    }

    /// Every route registered under `name`, in registration order
    pub fn routes_named(&self, name: &str) -> Vec<Route> {
        self.state()
            .routes
            .iter()
            .filter(|descriptor| descriptor.name == name)
            .map(|descriptor| Route::new(descriptor.id, descriptor.name.clone(), self.clone()))
            .collect()
    }

    pub fn descriptor(&self, id: RouteId) -> Result<RouteDescriptor> {
        self.state()
            .route(id)
            .cloned()
            .ok_or(RouterError::UnknownRoute(id))
    }

    /// Start a navigation to `route`.
    ///
    /// Validation errors are returned immediately and leave the state as it
    /// was. Otherwise the router enters the navigating state and the returned
    /// request settles when awaited.
    pub fn navigate_to(&self, route: RouteId, parameters: ParameterValues) -> Result<NavigationRequest> {
        self.inner.navigation.call(Navigation { route, parameters })
    }

    /// The navigation effect, for substituting navigation in tests
    pub fn navigation(&self) -> &Effect<Navigation, Result<NavigationRequest>> {
        &self.inner.navigation
    }

    pub fn is_navigating(&self) -> bool {
        self.state().navigation_is_in_progress
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.inner.config)
            .field("routes", &self.state().routes.len())
            .finish()
    }
}
