//! Dispatch error definitions.

use axum::http::{Method, StatusCode};
use thiserror::Error;

/// Why an action handler could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    /// No controller is bound under the requested name.
    #[error("controller is not registered")]
    UnknownController,

    /// The controller exists but does not answer to the action.
    #[error("action is not defined on the controller")]
    UnknownAction,
}

/// Errors that can occur while registering, resolving or dispatching routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No registered route matches the request method and path.
    #[error("no route matches {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// Reverse lookup for a name that was never registered.
    #[error("named route [{name}] not found")]
    NamedRouteNotFound { name: String },

    /// A middleware reference could not be turned into a middleware.
    #[error("middleware {name} is invalid: {reason}")]
    InvalidMiddleware { name: String, reason: String },

    /// A `controller@action` handler could not be resolved.
    #[error("handler {controller}@{action} could not be resolved: {failure}")]
    HandlerResolution {
        controller: String,
        action: String,
        #[source]
        failure: ResolutionFailure,
    },
}

impl Error {
    /// Conventional HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::RouteNotFound { .. } | Error::NamedRouteNotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidMiddleware { .. } | Error::HandlerResolution { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for both the dispatch and the reverse-lookup flavour of "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::RouteNotFound { .. } | Error::NamedRouteNotFound { .. }
        )
    }
}

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, Error>;
