//! Route identities, declarations and handles

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::navigation::NavigationRequest;
use crate::params::{ParameterSchema, ParameterValue, ParameterValues};
use crate::router::Router;
use crate::selectors;
use crate::template::{self, TemplateError};
use crate::Result;

/// Stable identifier of a registered route, assigned in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub usize);

impl RouteId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<&Route> for RouteId {
    fn from(route: &Route) -> Self {
        route.id()
    }
}

/// A registered route. Never mutated or removed after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub id: RouteId,
    pub name: String,
    pub parent: Option<RouteId>,
    #[serde(default)]
    pub parameter_defaults: ParameterValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ParameterSchema>,
}

/// Everything `add_route` needs besides the name
#[derive(Debug, Clone, Default)]
pub struct RouteConfiguration {
    pub(crate) parent: Option<RouteId>,
    pub(crate) defaults: ParameterValues,
    path_template: Option<String>,
    query_template: Option<String>,
    schema: Option<ParameterSchema>,
}

impl RouteConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nest the route under an already registered parent
    pub fn parent(mut self, parent: impl Into<RouteId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Value used when a navigation omits `name`
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Declare parameters through a path template such as `/users/id:number`
    pub fn path(mut self, template: impl Into<String>) -> Self {
        self.path_template = Some(template.into());
        self
    }

    /// Declare parameters through a query template such as `q[&page:number]`
    pub fn query(mut self, template: impl Into<String>) -> Self {
        self.query_template = Some(template.into());
        self
    }

    /// Declare parameters explicitly, in addition to any templates
    pub fn schema(mut self, schema: ParameterSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Parse templates and merge them with the explicit schema.
    ///
    /// A route with neither templates nor a schema accepts any parameters.
    pub(crate) fn resolve_schema(&self) -> Result<Option<ParameterSchema>, TemplateError> {
        if self.path_template.is_none() && self.query_template.is_none() {
            return Ok(self.schema.clone());
        }

        let mut schema = template::parse(
            self.path_template.as_deref().unwrap_or_default(),
            self.query_template.as_deref().unwrap_or_default(),
        )?;
        if let Some(explicit) = &self.schema {
            schema.extend(explicit.clone())?;
        }
        Ok(Some(schema))
    }
}

/// Handle to a registered route, bound to the router that owns it
#[derive(Clone)]
pub struct Route {
    id: RouteId,
    name: String,
    router: Router,
}

impl Route {
    pub(crate) fn new(id: RouteId, name: String, router: Router) -> Self {
        Self { id, name, router }
    }

    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this route is on the active chain.
    ///
    /// A handle only exists for a registered id and routes are never removed,
    /// so the unknown-route error of [`selectors::is_active`] cannot occur here.
    pub fn is_active(&self) -> bool {
        matches!(selectors::is_active(&self.router.state(), self.id), Ok(true))
    }

    /// Parameter values of this route; fails unless the route is active
    pub fn parameter_values(&self) -> Result<ParameterValues> {
        selectors::parameter_values(&self.router.state(), self.id)
    }

    /// Parameter values of this route merged over those of its active ancestors
    pub fn effective_parameter_values(&self) -> Result<ParameterValues> {
        selectors::effective_parameter_values(&self.router.state(), self.id)
    }

    /// Start navigating to this route
    pub fn navigate_to(&self, parameters: ParameterValues) -> Result<NavigationRequest> {
        self.router.navigate_to(self.id, parameters)
    }

    /// The registered descriptor of this route
    pub fn descriptor(&self) -> Result<RouteDescriptor> {
        self.router.descriptor(self.id)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
