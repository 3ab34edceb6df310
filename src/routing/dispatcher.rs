//! Request dispatch.
//!
//! # State Machine (per call)
//! ```text
//! START → SCANNING → MIDDLEWARE_RUNNING → HANDLER_RUNNING → DONE
//!             │               │                  │
//!             └───────────────┴──────────────────┴──→ FAILED (Error)
//! ```
//!
//! # Design Decisions
//! - Linear scan in registration order; the first method + path match wins
//! - Trailing slashes on the request path are ignored (`/users/` hits `/users`)
//! - Middleware and controllers are resolved lazily, per dispatch
//! - The matched route travels with the call (`RouteMatch`, `Outcome`);
//!   there is no process-wide "current route"
//! - Synchronous, no retries: every error goes straight back to the caller

use std::ops::Index;
use std::sync::Arc;

use axum::response::Response;

use crate::http::request::Request;
use crate::routing::error::{Error, Result};
use crate::routing::handler::{ControllerRegistry, HandlerRef};
use crate::routing::middleware::{ChainDecision, MiddlewareRef, MiddlewareRegistry};
use crate::routing::params::Params;
use crate::routing::table::{Route, RouteTable};

/// The route serving the current call and the parameters it captured.
///
/// Handed to handlers next to the request; indexing gives the captures in
/// template order.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    route: Arc<Route>,
    params: Params,
}

impl RouteMatch {
    pub fn new(route: Arc<Route>, params: Params) -> Self {
        Self { route, params }
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Capture by placeholder name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }
}

impl Index<usize> for RouteMatch {
    type Output = str;

    fn index(&self, i: usize) -> &Self::Output {
        &self.params[i]
    }
}

/// Result of a dispatch that reached a route.
#[derive(Debug)]
pub enum Outcome {
    /// The handler ran and produced `response`.
    Handled { route: Arc<Route>, response: Response },
    /// A middleware terminated the exchange before the handler ran.
    Halted {
        route: Arc<Route>,
        middleware: String,
        response: Response,
    },
}

impl Outcome {
    /// The route that served the response. `None` when middleware halted.
    pub fn current_route(&self) -> Option<&Arc<Route>> {
        match self {
            Outcome::Handled { route, .. } => Some(route),
            Outcome::Halted { .. } => None,
        }
    }

    /// The route that matched, whether or not its handler ran.
    pub fn matched_route(&self) -> &Arc<Route> {
        match self {
            Outcome::Handled { route, .. } | Outcome::Halted { route, .. } => route,
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, Outcome::Halted { .. })
    }

    pub fn response(&self) -> &Response {
        match self {
            Outcome::Handled { response, .. } | Outcome::Halted { response, .. } => response,
        }
    }

    pub fn into_response(self) -> Response {
        match self {
            Outcome::Handled { response, .. } | Outcome::Halted { response, .. } => response,
        }
    }
}

/// Resolves requests against a frozen route table.
#[derive(Debug, Default)]
pub struct Dispatcher {
    table: RouteTable,
    controllers: ControllerRegistry,
    middleware: MiddlewareRegistry,
}

impl Dispatcher {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table,
            controllers: ControllerRegistry::default(),
            middleware: MiddlewareRegistry::default(),
        }
    }

    pub fn with_controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = controllers;
        self
    }

    pub fn with_middleware(mut self, middleware: MiddlewareRegistry) -> Self {
        self.middleware = middleware;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Dispatch one request to the first matching route.
    pub fn dispatch(&self, request: &Request) -> Result<Outcome> {
        let path = trim_trailing_slash(request.path());

        // SCANNING
        let (route, params) = self
            .table
            .routes()
            .iter()
            .filter(|route| route.method() == request.method())
            .find_map(|route| route.matcher().captures(path).map(|params| (route, params)))
            .ok_or_else(|| {
                tracing::debug!(method = %request.method(), path = %path, "No route matched");
                Error::RouteNotFound {
                    method: request.method().clone(),
                    path: path.to_string(),
                }
            })?;

        tracing::debug!(
            method = %route.method(),
            template = %route.template(),
            name = route.name().unwrap_or("-"),
            params = params.len(),
            "Route matched"
        );

        // MIDDLEWARE_RUNNING
        for reference in route.middleware() {
            let middleware = self.middleware.resolve(reference).map_err(|e| {
                tracing::error!(template = %route.template(), error = %e, "Middleware resolution failed");
                e
            })?;

            if let ChainDecision::Halt(response) = middleware.handle(request) {
                let label = reference.label();
                tracing::debug!(
                    template = %route.template(),
                    middleware = %label,
                    status = %response.status(),
                    "Middleware halted request"
                );
                return Ok(Outcome::Halted {
                    route: route.clone(),
                    middleware: label,
                    response,
                });
            }
        }

        // HANDLER_RUNNING
        let current = RouteMatch::new(route.clone(), params);
        let response = match route.handler() {
            HandlerRef::Direct(handler) => handler.call(request, &current),
            HandlerRef::Action { controller, action } => {
                let instance = self.controllers.resolve(controller, action).map_err(|e| {
                    tracing::error!(template = %route.template(), error = %e, "Handler resolution failed");
                    e
                })?;
                instance.call(action, request, &current)
            }
        };

        Ok(Outcome::Handled {
            route: route.clone(),
            response,
        })
    }

    /// Build a URL for a named route. See [`RouteTable::resolve_url`].
    pub fn resolve_url<I, K, V>(&self, name: &str, params: I) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: std::fmt::Display,
    {
        self.table.resolve_url(name, params)
    }

    /// Check every named middleware and controller action against the
    /// registries, reporting all problems at once.
    pub fn validate(&self) -> std::result::Result<(), Vec<Error>> {
        let mut errors = Vec::new();

        for route in self.table.routes() {
            for reference in route.middleware() {
                if let MiddlewareRef::Named { .. } = reference {
                    if let Err(e) = self.middleware.resolve(reference) {
                        if !errors.contains(&e) {
                            errors.push(e);
                        }
                    }
                }
            }

            if let HandlerRef::Action { controller, action } = route.handler() {
                if let Err(e) = self.controllers.resolve(controller, action) {
                    if !errors.contains(&e) {
                        errors.push(e);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::{action, handler, Controller};
    use crate::routing::middleware::Middleware;
    use crate::routing::table::RouteOptions;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::Mutex;

    fn text(body: &'static str) -> HandlerRef {
        handler(move |_: &Request, _: &RouteMatch| body)
    }

    async fn body_of(outcome: Outcome) -> String {
        let bytes = axum::body::to_bytes(outcome.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(path: &str) -> Request {
        Request::builder().method("GET").uri(path).build()
    }

    #[test]
    fn test_trim_trailing_slash() {
        assert_eq!(trim_trailing_slash("/"), "/");
        assert_eq!(trim_trailing_slash("///"), "/");
        assert_eq!(trim_trailing_slash("/users/"), "/users");
        assert_eq!(trim_trailing_slash("/users"), "/users");
    }

    #[tokio::test]
    async fn test_first_registered_wins() {
        let mut table = RouteTable::new();
        table.get("/users/{id}", text("show"), RouteOptions::new());
        table.get("/users/new", text("new"), RouteOptions::new());
        let dispatcher = Dispatcher::new(table);

        let outcome = dispatcher.dispatch(&get("/users/new")).unwrap();
        assert_eq!(outcome.current_route().unwrap().template(), "/users/{id}");
        assert_eq!(body_of(outcome).await, "show");
    }

    #[tokio::test]
    async fn test_method_must_match() {
        let mut table = RouteTable::new();
        table.post("/login", text("post"), RouteOptions::new());
        table.get("/login", text("get"), RouteOptions::new());
        let dispatcher = Dispatcher::new(table);

        let outcome = dispatcher.dispatch(&get("/login/")).unwrap();
        assert_eq!(body_of(outcome).await, "get");
    }

    #[test]
    fn test_no_match_is_route_not_found() {
        let mut table = RouteTable::new();
        table.get("/", text("home"), RouteOptions::new());
        let dispatcher = Dispatcher::new(table);

        let err = dispatcher
            .dispatch(&Request::builder().method("PUT").uri("/").build())
            .unwrap_err();
        assert_eq!(
            err,
            Error::RouteNotFound {
                method: axum::http::Method::PUT,
                path: "/".into()
            }
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_params_reach_handler_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut table = RouteTable::new();
        table.get(
            "/posts/{slug}/comments/{cid}",
            handler(move |_: &Request, route: &RouteMatch| {
                let mut seen = sink.lock().unwrap();
                seen.push(route[0].to_string());
                seen.push(route[1].to_string());
                seen.push(route.param("cid").unwrap_or_default().to_string());
                seen.push(route.route().name().unwrap_or_default().to_string());
                StatusCode::NO_CONTENT
            }),
            RouteOptions::named("comment.show"),
        );
        let dispatcher = Dispatcher::new(table);

        let outcome = dispatcher
            .dispatch(&get("/posts/hello-world/comments/42"))
            .unwrap();
        assert_eq!(outcome.response().status(), StatusCode::NO_CONTENT);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["hello-world", "42", "42", "comment.show"]
        );
    }

    struct Record {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Record {
        fn handle(&self, _request: &Request) -> ChainDecision {
            self.log.lock().unwrap().push(self.tag);
            ChainDecision::Continue
        }
    }

    struct Block;

    impl Middleware for Block {
        fn handle(&self, _request: &Request) -> ChainDecision {
            ChainDecision::Halt(StatusCode::FORBIDDEN.into_response())
        }

        fn name(&self) -> &str {
            "block"
        }
    }

    #[test]
    fn test_middleware_runs_local_then_group() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let record = |tag| MiddlewareRef::instance(Record { tag, log: log.clone() });

        let mut table = RouteTable::new();
        table.group(RouteOptions::new().middleware(record("B")), |routes| {
            routes.get(
                "/admin",
                text("admin"),
                RouteOptions::new().middleware(record("A")),
            );
        });
        let dispatcher = Dispatcher::new(table);

        let outcome = dispatcher.dispatch(&get("/admin")).unwrap();
        assert!(!outcome.is_halted());
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_halt_skips_rest_of_chain_and_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let called = Arc::new(Mutex::new(false));
        let flag = called.clone();

        let mut table = RouteTable::new();
        table.get(
            "/secret",
            handler(move |_: &Request, _: &RouteMatch| {
                *flag.lock().unwrap() = true;
                "secret"
            }),
            RouteOptions::new()
                .middleware(MiddlewareRef::instance(Block))
                .middleware(MiddlewareRef::instance(Record { tag: "after", log: log.clone() })),
        );
        let dispatcher = Dispatcher::new(table);

        let outcome = dispatcher.dispatch(&get("/secret")).unwrap();
        assert!(outcome.is_halted());
        assert!(outcome.current_route().is_none());
        assert_eq!(outcome.matched_route().template(), "/secret");
        assert_eq!(outcome.response().status(), StatusCode::FORBIDDEN);
        assert!(matches!(outcome, Outcome::Halted { ref middleware, .. } if middleware == "block"));
        assert!(log.lock().unwrap().is_empty());
        assert!(!*called.lock().unwrap());
    }

    #[test]
    fn test_unknown_middleware_fails_dispatch() {
        let mut table = RouteTable::new();
        table.get(
            "/",
            text("home"),
            RouteOptions::new().middleware(MiddlewareRef::named("missing")),
        );
        let dispatcher = Dispatcher::new(table);

        let err = dispatcher.dispatch(&get("/")).unwrap_err();
        assert!(matches!(err, Error::InvalidMiddleware { ref name, .. } if name == "missing"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    struct Users;

    impl Controller for Users {
        fn responds_to(&self, action: &str) -> bool {
            matches!(action, "show" | "destroy")
        }

        fn call(&self, action: &str, _request: &Request, route: &RouteMatch) -> Response {
            format!("{} {}", action, &route[0]).into_response()
        }
    }

    fn controllers() -> ControllerRegistry {
        let mut registry = ControllerRegistry::new();
        registry.bind("Users", || Users);
        registry
    }

    #[tokio::test]
    async fn test_controller_action() {
        let mut table = RouteTable::new();
        table.get("/users/{id}", action("Users", "show"), RouteOptions::new());
        table.delete("/users/{id}", action("Users", "destroy"), RouteOptions::new());
        let dispatcher = Dispatcher::new(table).with_controllers(controllers());

        let outcome = dispatcher.dispatch(&get("/users/7")).unwrap();
        assert_eq!(body_of(outcome).await, "show 7");

        let overridden = Request::builder()
            .method("POST")
            .uri("/users/7")
            .form("_method", "DELETE")
            .build();
        let outcome = dispatcher.dispatch(&overridden).unwrap();
        assert_eq!(body_of(outcome).await, "destroy 7");
    }

    #[test]
    fn test_controller_resolution_errors() {
        let mut table = RouteTable::new();
        table.get("/a", action("Users", "edit"), RouteOptions::new());
        table.get("/b", action("Posts", "index"), RouteOptions::new());
        let dispatcher = Dispatcher::new(table).with_controllers(controllers());

        let err = dispatcher.dispatch(&get("/a")).unwrap_err();
        assert!(matches!(
            err,
            Error::HandlerResolution { failure: crate::routing::ResolutionFailure::UnknownAction, .. }
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = dispatcher.dispatch(&get("/b")).unwrap_err();
        assert!(matches!(
            err,
            Error::HandlerResolution { failure: crate::routing::ResolutionFailure::UnknownController, .. }
        ));
    }

    #[test]
    fn test_validate_reports_every_problem_once() {
        let mut table = RouteTable::new();
        table.get("/a", action("Users", "show"), RouteOptions::new());
        table.any(
            "/b",
            action("Posts", "index"),
            RouteOptions::new().middleware(MiddlewareRef::named("auth")),
        );
        let dispatcher = Dispatcher::new(table).with_controllers(controllers());

        let errors = dispatcher.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(e, Error::InvalidMiddleware { .. })));
        assert!(errors.iter().any(|e| matches!(e, Error::HandlerResolution { .. })));

        let mut ok = RouteTable::new();
        ok.get("/a", action("Users", "show"), RouteOptions::new());
        assert!(Dispatcher::new(ok).with_controllers(controllers()).validate().is_ok());
    }

    #[test]
    fn test_dispatcher_exposes_reverse_lookup() {
        let mut table = RouteTable::new();
        table.get("/users/{id}", text("user"), RouteOptions::named("user.show"));
        let dispatcher = Dispatcher::new(table);

        assert_eq!(dispatcher.resolve_url("user.show", [("id", "7")]).unwrap(), "/users/7");
        assert_eq!(dispatcher.table().len(), 1);
    }
}
