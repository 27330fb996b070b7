//! Route registry
//!
//! Routes are appended to the router state and never removed, so a route id
//! is simply its index in `RouterState::routes`. Parents must be registered
//! before their children, which keeps the forest acyclic by construction.

use tracing::debug;
use wp_core::StateModule;

use crate::config::RouterConfig;
use crate::route::{RouteConfiguration, RouteDescriptor, RouteId};
use crate::state::RouterState;
use crate::{Result, RouterError};

/// Validate `configuration` and append a new route in one transition.
///
/// A rejected registration leaves the state untouched and consumes no id.
pub(crate) fn register_route(
    module: &StateModule<RouterState>,
    config: &RouterConfig,
    name: &str,
    configuration: RouteConfiguration,
) -> Result<RouteDescriptor> {
    let schema = configuration.resolve_schema()?;

    let descriptor = module.update(|cx| {
        let state = cx.state();
        let id = RouteId(state.routes.len());

        if let Some(parent) = configuration.parent {
            if !state.contains(parent) {
                return Err(RouterError::MalformedRouteForest {
                    route: id,
                    reason: format!("parent {} is not registered", parent),
                });
            }
            let depth = resolve_chain(&state.routes, parent)?.len() + 1;
            if depth > config.max_depth {
                return Err(RouterError::MalformedRouteForest {
                    route: id,
                    reason: format!("depth {} exceeds the maximum of {}", depth, config.max_depth),
                });
            }
        }

        if let Some(schema) = &schema {
            for (default_name, value) in &configuration.defaults {
                let spec = schema.get(default_name).ok_or_else(|| RouterError::InvalidDefault {
                    route: id,
                    name: default_name.clone(),
                    reason: "parameter is not declared".to_string(),
                })?;
                if spec.kind != value.kind() {
                    return Err(RouterError::InvalidDefault {
                        route: id,
                        name: default_name.clone(),
                        reason: format!("expected a {}, got a {}", spec.kind, value.kind()),
                    });
                }
            }
        }

        let descriptor = RouteDescriptor {
            id,
            name: name.to_string(),
            parent: configuration.parent,
            parameter_defaults: configuration.defaults.clone(),
            schema: schema.clone(),
        };
        cx.state_mut().routes.push(descriptor.clone());
        Ok(descriptor)
    })?;

    debug!(
        route = %descriptor.id,
        name = %descriptor.name,
        parent = ?descriptor.parent,
        "registered route"
    );
    Ok(descriptor)
}

/// Ancestor chain of `route`, root first and ending with `route` itself.
///
/// The walk takes at most `routes.len()` steps; a longer walk or a missing
/// parent means the forest is malformed.
pub fn resolve_chain(routes: &[RouteDescriptor], route: RouteId) -> Result<Vec<RouteId>> {
    let mut chain = Vec::new();
    let mut current = Some(route);

    while let Some(id) = current {
        if chain.len() >= routes.len() {
            return Err(RouterError::MalformedRouteForest {
                route,
                reason: "parent chain does not terminate".to_string(),
            });
        }
        let descriptor = routes.get(id.index()).ok_or_else(|| {
            if id == route {
                RouterError::UnknownRoute(route)
            } else {
                RouterError::MalformedRouteForest {
                    route,
                    reason: format!("ancestor {} is not registered", id),
                }
            }
        })?;
        chain.push(id);
        current = descriptor.parent;
    }

    chain.reverse();
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParameterKind, ParameterValues};
    use crate::template::TemplateError;

    fn module() -> StateModule<RouterState> {
        StateModule::new("router", RouterState::default())
    }

    fn descriptor(id: usize, parent: Option<usize>) -> RouteDescriptor {
        RouteDescriptor {
            id: RouteId(id),
            name: format!("route-{}", id),
            parent: parent.map(RouteId),
            parameter_defaults: ParameterValues::new(),
            schema: None,
        }
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let module = module();
        let config = RouterConfig::default();
        for (expected, name) in ["home", "home", "settings"].iter().enumerate() {
            let descriptor =
                register_route(&module, &config, name, RouteConfiguration::new()).unwrap();
            assert_eq!(descriptor.id, RouteId(expected));
        }
        assert_eq!(module.get().routes.len(), 3);
    }

    #[test]
    fn test_unknown_parent_is_rejected_without_consuming_an_id() {
        let module = module();
        let config = RouterConfig::default();
        let err = register_route(
            &module,
            &config,
            "orphan",
            RouteConfiguration::new().parent(RouteId(4)),
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::MalformedRouteForest { route: RouteId(0), .. }));

        let next = register_route(&module, &config, "root", RouteConfiguration::new()).unwrap();
        assert_eq!(next.id, RouteId(0));
    }

    #[test]
    fn test_max_depth_is_enforced() {
        let module = module();
        let config = RouterConfig {
            max_depth: 2,
            ..RouterConfig::default()
        };
        let root = register_route(&module, &config, "root", RouteConfiguration::new()).unwrap();
        let child = register_route(
            &module,
            &config,
            "child",
            RouteConfiguration::new().parent(root.id),
        )
        .unwrap();

        let err = register_route(
            &module,
            &config,
            "grandchild",
            RouteConfiguration::new().parent(child.id),
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::MalformedRouteForest { .. }));
    }

    #[test]
    fn test_defaults_are_checked_against_schema() {
        let module = module();
        let config = RouterConfig::default();

        let err = register_route(
            &module,
            &config,
            "user",
            RouteConfiguration::new()
                .path("/users/id:number")
                .with_default("id", "first"),
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::InvalidDefault { ref name, .. } if name == "id"));

        let err = register_route(
            &module,
            &config,
            "user",
            RouteConfiguration::new()
                .path("/users/id:number")
                .with_default("tab", "posts"),
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::InvalidDefault { ref name, .. } if name == "tab"));

        let ok = register_route(
            &module,
            &config,
            "user",
            RouteConfiguration::new()
                .path("/users/id:number")
                .with_default("id", 1),
        )
        .unwrap();
        assert_eq!(ok.schema.unwrap().get("id").unwrap().kind, ParameterKind::Number);
    }

    #[test]
    fn test_bad_template_is_rejected() {
        let module = module();
        let err = register_route(
            &module,
            &RouterConfig::default(),
            "search",
            RouteConfiguration::new().query("[&q"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RouterError::InvalidTemplate(TemplateError::UnbalancedGroup(_))
        ));
        assert!(module.get().routes.is_empty());
    }

    #[test]
    fn test_resolve_chain_is_root_first() {
        let routes = vec![
            descriptor(0, None),
            descriptor(1, Some(0)),
            descriptor(2, Some(1)),
            descriptor(3, Some(0)),
        ];
        assert_eq!(
            resolve_chain(&routes, RouteId(2)).unwrap(),
            vec![RouteId(0), RouteId(1), RouteId(2)]
        );
        assert_eq!(resolve_chain(&routes, RouteId(3)).unwrap(), vec![RouteId(0), RouteId(3)]);
    }

    #[test]
    fn test_resolve_chain_detects_cycles() {
        // Only reachable by building descriptors by hand
        let routes = vec![descriptor(0, Some(1)), descriptor(1, Some(0))];
        assert!(matches!(
            resolve_chain(&routes, RouteId(0)),
            Err(RouterError::MalformedRouteForest { .. })
        ));
    }

    #[test]
    fn test_resolve_chain_detects_missing_ancestor() {
        let routes = vec![descriptor(0, Some(7))];
        assert!(matches!(
            resolve_chain(&routes, RouteId(0)),
            Err(RouterError::MalformedRouteForest { .. })
        ));
        assert!(matches!(
            resolve_chain(&routes, RouteId(5)),
            Err(RouterError::UnknownRoute(RouteId(5)))
        ));
    }
}
