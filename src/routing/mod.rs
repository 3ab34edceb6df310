//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap (once):
//!     RouteTable::get/post/put/delete/any/group
//!     → matcher.rs (compile template into segments)
//!     → Dispatcher::new(table) (frozen, shared via Arc)
//!
//! Per request:
//!     Request
//!     → dispatcher.rs (scan routes in registration order)
//!     → middleware.rs (resolve + run chain, may halt)
//!     → handler.rs (direct closure or controller action)
//!     → Outcome { route, response } or Error
//! ```
//!
//! # Design Decisions
//! - Routes compiled at registration, immutable while serving
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod middleware;
pub mod params;
pub mod table;

pub use dispatcher::{Dispatcher, Outcome, RouteMatch};
pub use error::{Error, ResolutionFailure};
pub use handler::{action, handler, Controller, ControllerRegistry, Handler, HandlerRef};
pub use matcher::{normalize_template, Matcher, Segment};
pub use middleware::{ChainDecision, Middleware, MiddlewareRef, MiddlewareRegistry};
pub use params::{Param, Params};
pub use table::{Route, RouteOptions, RouteTable};
