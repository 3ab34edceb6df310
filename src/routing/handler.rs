//! Route handlers and the controller registry.
//!
//! A route either owns its handler directly or names a controller action
//! (`"AuthController"`, `"login"`) that is looked up when the route is
//! dispatched. Lookups go through an explicit [`ControllerRegistry`]; there is
//! no reflection or string-to-type magic.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};

use crate::http::request::Request;
use crate::routing::dispatcher::RouteMatch;
use crate::routing::error::{Error, ResolutionFailure, Result};

/// A directly invocable route handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: &Request, route: &RouteMatch) -> Response;
}

impl<F, R> Handler for F
where
    F: Fn(&Request, &RouteMatch) -> R + Send + Sync + 'static,
    R: IntoResponse,
{
    fn call(&self, request: &Request, route: &RouteMatch) -> Response {
        (self)(request, route).into_response()
    }
}

/// A group of named actions, instantiated per dispatch by the registry.
pub trait Controller: Send + Sync {
    /// Whether `action` names an action of this controller.
    fn responds_to(&self, action: &str) -> bool;

    /// Run an action. Only called after [`Controller::responds_to`] said yes.
    fn call(&self, action: &str, request: &Request, route: &RouteMatch) -> Response;
}

/// What a route runs once its middleware chain lets the request through.
#[derive(Clone)]
pub enum HandlerRef {
    Direct(Arc<dyn Handler>),
    Action { controller: String, action: String },
}

impl HandlerRef {
    pub fn direct<H: Handler>(handler: H) -> Self {
        HandlerRef::Direct(Arc::new(handler))
    }

    pub fn action(controller: impl Into<String>, action: impl Into<String>) -> Self {
        HandlerRef::Action {
            controller: controller.into(),
            action: action.into(),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Direct(_) => f.write_str("Direct(<fn>)"),
            HandlerRef::Action { controller, action } => write!(f, "Action({controller}@{action})"),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Direct(_) => f.write_str("closure"),
            HandlerRef::Action { controller, action } => write!(f, "{controller}@{action}"),
        }
    }
}

/// Wrap a closure or function as a route handler.
///
/// ```
/// use switchyard::routing::{handler, RouteMatch, RouteOptions, RouteTable};
/// use switchyard::http::Request;
///
/// let mut routes = RouteTable::new();
/// routes.get(
///     "/users/{id}",
///     handler(|_req: &Request, route: &RouteMatch| format!("user {}", &route[0])),
///     RouteOptions::named("user.show"),
/// );
/// ```
pub fn handler<F, R>(f: F) -> HandlerRef
where
    F: Fn(&Request, &RouteMatch) -> R + Send + Sync + 'static,
    R: IntoResponse,
{
    HandlerRef::direct(f)
}

/// Shorthand for [`HandlerRef::action`].
pub fn action(controller: impl Into<String>, action: impl Into<String>) -> HandlerRef {
    HandlerRef::action(controller, action)
}

type ControllerFactory = Arc<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

/// Maps controller names to factories producing fresh instances.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a factory. Rebinding replaces the previous factory.
    pub fn bind<F, C>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        self.factories
            .insert(name.into(), Arc::new(move || Box::new(factory()) as Box<dyn Controller>));
        self
    }

    /// Bind `name` to `C::default()`.
    pub fn bind_default<C>(&mut self, name: impl Into<String>) -> &mut Self
    where
        C: Controller + Default + 'static,
    {
        self.bind(name, C::default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Instantiate the controller and confirm it answers to `action`.
    pub fn resolve(&self, controller: &str, action: &str) -> Result<Box<dyn Controller>> {
        let failure = |failure| Error::HandlerResolution {
            controller: controller.to_string(),
            action: action.to_string(),
            failure,
        };

        let factory = self
            .factories
            .get(controller)
            .ok_or_else(|| failure(ResolutionFailure::UnknownController))?;

        let instance = factory();
        if !instance.responds_to(action) {
            return Err(failure(ResolutionFailure::UnknownAction));
        }

        Ok(instance)
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pages;

    impl Controller for Pages {
        fn responds_to(&self, action: &str) -> bool {
            action == "about"
        }

        fn call(&self, _action: &str, _request: &Request, _route: &RouteMatch) -> Response {
            "about".into_response()
        }
    }

    #[test]
    fn test_resolve_known_action() {
        let mut registry = ControllerRegistry::new();
        registry.bind_default::<Pages>("Pages");

        assert!(registry.contains("Pages"));
        assert!(registry.resolve("Pages", "about").is_ok());
    }

    #[test]
    fn test_resolve_failures() {
        let mut registry = ControllerRegistry::new();
        registry.bind("Pages", || Pages);

        let err = registry.resolve("Missing", "about").err().unwrap();
        assert_eq!(
            err,
            Error::HandlerResolution {
                controller: "Missing".into(),
                action: "about".into(),
                failure: ResolutionFailure::UnknownController,
            }
        );

        let err = registry.resolve("Pages", "contact").err().unwrap();
        assert!(matches!(
            err,
            Error::HandlerResolution {
                failure: ResolutionFailure::UnknownAction,
                ..
            }
        ));
    }

    #[test]
    fn test_handler_ref_display() {
        assert_eq!(action("AuthController", "login").to_string(), "AuthController@login");
        assert_eq!(handler(|_: &Request, _: &RouteMatch| "ok").to_string(), "closure");
    }
}
