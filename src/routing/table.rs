//! Route registration and reverse lookup.
//!
//! # Responsibilities
//! - Store routes in registration order (order is priority: first match wins)
//! - Apply group middleware to the routes registered inside a group
//! - Index named routes and generate URLs from them
//!
//! # Design Decisions
//! - Built once during bootstrap, then moved into a `Dispatcher`; never mutated
//!   while serving, so no locking
//! - Duplicate names are allowed; the last registration wins the lookup
//! - Group middleware is appended after route-local middleware; nested groups
//!   apply innermost first, then each enclosing group outward

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use axum::http::Method;

use crate::routing::error::{Error, Result};
use crate::routing::handler::HandlerRef;
use crate::routing::matcher::{placeholder_name, Matcher};
use crate::routing::middleware::MiddlewareRef;

/// Methods registered by [`RouteTable::any`].
pub const ANY_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// A registered binding of method and path template to a handler.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    handler: HandlerRef,
    middleware: Vec<MiddlewareRef>,
    name: Option<String>,
    matcher: Matcher,
}

impl Route {
    fn new(method: Method, template: &str, handler: HandlerRef, options: RouteOptions) -> Self {
        Self {
            method,
            handler,
            middleware: options.middleware,
            name: options.name,
            matcher: Matcher::compile(template),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Normalized path template.
    pub fn template(&self) -> &str {
        self.matcher.template()
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// Full middleware chain, in execution order.
    pub fn middleware(&self) -> &[MiddlewareRef] {
        &self.middleware
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

/// Per-route (or per-group) registration options.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub middleware: Vec<MiddlewareRef>,
    /// Ignored for groups.
    pub name: Option<String>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying only a route name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().name(name)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn middleware(mut self, middleware: MiddlewareRef) -> Self {
        self.middleware.push(middleware);
        self
    }
}

/// Ordered route registry with a name index.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    named: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route for `method`.
    pub fn register(
        &mut self,
        method: Method,
        template: &str,
        handler: HandlerRef,
        options: RouteOptions,
    ) -> &mut Self {
        let route = Route::new(method, template, handler, options);

        tracing::trace!(
            method = %route.method,
            template = %route.template(),
            name = ?route.name,
            "Route registered"
        );

        if let Some(name) = &route.name {
            self.named.insert(name.clone(), self.routes.len());
        }
        self.routes.push(Arc::new(route));
        self
    }

    pub fn get(&mut self, template: &str, handler: HandlerRef, options: RouteOptions) -> &mut Self {
        self.register(Method::GET, template, handler, options)
    }

    pub fn post(&mut self, template: &str, handler: HandlerRef, options: RouteOptions) -> &mut Self {
        self.register(Method::POST, template, handler, options)
    }

    pub fn put(&mut self, template: &str, handler: HandlerRef, options: RouteOptions) -> &mut Self {
        self.register(Method::PUT, template, handler, options)
    }

    pub fn delete(&mut self, template: &str, handler: HandlerRef, options: RouteOptions) -> &mut Self {
        self.register(Method::DELETE, template, handler, options)
    }

    /// Register the same route for GET, POST, PUT and DELETE.
    pub fn any(&mut self, template: &str, handler: HandlerRef, options: RouteOptions) -> &mut Self {
        for method in ANY_METHODS {
            self.register(method, template, handler.clone(), options.clone());
        }
        self
    }

    /// Run `block`, then append the group middleware to every route it registered.
    pub fn group<F>(&mut self, options: RouteOptions, block: F) -> &mut Self
    where
        F: FnOnce(&mut RouteTable),
    {
        let before = self.routes.len();
        block(self);

        if options.middleware.is_empty() {
            return self;
        }

        for route in &mut self.routes[before..] {
            Arc::make_mut(route)
                .middleware
                .extend(options.middleware.iter().cloned());
        }
        self
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The route currently registered under `name`.
    pub fn named(&self, name: &str) -> Option<&Arc<Route>> {
        self.named.get(name).map(|&index| &self.routes[index])
    }

    /// Build a URL for a named route.
    ///
    /// Every `{key}` in the template is replaced by the matching parameter;
    /// placeholders without a parameter are left as they are.
    pub fn resolve_url<I, K, V>(&self, name: &str, params: I) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        let route = self.named(name).ok_or_else(|| Error::NamedRouteNotFound {
            name: name.to_string(),
        })?;

        let values: HashMap<String, String> = params
            .into_iter()
            .map(|(key, value)| (key.as_ref().to_string(), value.to_string()))
            .collect();

        Ok(substitute(route.template(), &values))
    }
}

/// Single pass over `template`, replacing `{key}` tokens found in `values`.
fn substitute(template: &str, values: &HashMap<String, String>) -> String {
    let mut url = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        url.push_str(&rest[..open]);
        let candidate = &rest[open..];

        let token = candidate
            .find('}')
            .map(|close| &candidate[..=close])
            .and_then(|token| placeholder_name(token).map(|key| (token, key)));

        match token.and_then(|(token, key)| values.get(key).map(|value| (token, value))) {
            Some((token, value)) => {
                url.push_str(value);
                rest = &candidate[token.len()..];
            }
            None => {
                url.push('{');
                rest = &candidate[1..];
            }
        }
    }

    url.push_str(rest);
    url
}
