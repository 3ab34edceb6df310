//! Middleware capability and the middleware registry.
//!
//! # Responsibilities
//! - Define the single middleware capability: inspect a request, continue or halt
//! - Reference middleware by name (with string arguments) or by instance
//! - Resolve named references through a registry at dispatch time
//!
//! # Design Decisions
//! - No base type; any `Send + Sync` type implementing [`Middleware`] qualifies
//! - A halt carries the response that ends the exchange (redirect, 403, ...)
//! - Unknown names or rejected arguments are configuration bugs, reported as
//!   [`Error::InvalidMiddleware`] and never retried

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::response::Response;

use crate::http::request::Request;
use crate::routing::error::{Error, Result};

/// A middleware's verdict on a request.
#[derive(Debug)]
pub enum ChainDecision {
    /// Let the next middleware (or the handler) run.
    Continue,
    /// Terminate the exchange with this response.
    Halt(Response),
}

impl ChainDecision {
    pub fn is_continue(&self) -> bool {
        matches!(self, ChainDecision::Continue)
    }
}

/// An access-control unit run before a route handler.
pub trait Middleware: Send + Sync {
    fn handle(&self, request: &Request) -> ChainDecision;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Reference to a middleware, stored on routes.
#[derive(Clone)]
pub enum MiddlewareRef {
    /// Resolved through a [`MiddlewareRegistry`] when the route is dispatched.
    Named { name: String, args: Vec<String> },
    Instance(Arc<dyn Middleware>),
}

impl MiddlewareRef {
    pub fn named(name: impl Into<String>) -> Self {
        MiddlewareRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument passed to the registry factory.
    ///
    /// Has no effect on instance references.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        if let MiddlewareRef::Named { args, .. } = &mut self {
            args.push(value.into());
        }
        self
    }

    pub fn instance<M: Middleware + 'static>(middleware: M) -> Self {
        MiddlewareRef::Instance(Arc::new(middleware))
    }

    /// Label used in logs and in the route listing.
    pub fn label(&self) -> String {
        match self {
            MiddlewareRef::Named { name, args } if args.is_empty() => name.clone(),
            MiddlewareRef::Named { name, args } => format!("{}:{}", name, args.join(",")),
            MiddlewareRef::Instance(middleware) => middleware.name().to_string(),
        }
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Named { name, args } => f
                .debug_struct("Named")
                .field("name", name)
                .field("args", args)
                .finish(),
            MiddlewareRef::Instance(middleware) => {
                f.debug_tuple("Instance").field(&middleware.name()).finish()
            }
        }
    }
}

/// Why a factory refused to build a middleware.
pub type FactoryError = String;

type MiddlewareFactory =
    Arc<dyn Fn(&[String]) -> std::result::Result<Arc<dyn Middleware>, FactoryError> + Send + Sync>;

/// Maps middleware names to factories taking the reference's arguments.
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    factories: HashMap<String, MiddlewareFactory>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a factory. The factory may reject the arguments.
    pub fn bind<F, M>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&[String]) -> std::result::Result<M, FactoryError> + Send + Sync + 'static,
        M: Middleware + 'static,
    {
        self.factories.insert(
            name.into(),
            Arc::new(move |args: &[String]| {
                factory(args).map(|m| Arc::new(m) as Arc<dyn Middleware>)
            }),
        );
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Turn a reference into a runnable middleware.
    pub fn resolve(&self, reference: &MiddlewareRef) -> Result<Arc<dyn Middleware>> {
        match reference {
            MiddlewareRef::Instance(middleware) => Ok(middleware.clone()),
            MiddlewareRef::Named { name, args } => {
                let factory = self.factories.get(name).ok_or_else(|| Error::InvalidMiddleware {
                    name: name.clone(),
                    reason: "no middleware registered under this name".to_string(),
                })?;

                factory(args).map_err(|reason| Error::InvalidMiddleware {
                    name: name.clone(),
                    reason,
                })
            }
        }
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}
