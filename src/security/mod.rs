//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher matches a route
//!     → route middleware chain
//!     → access_control.rs (auth / guest guard, may redirect)
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Whether a caller is logged in is an opaque predicate supplied at bootstrap
//! - Guards halt with a redirect; they never touch the request

pub mod access_control;

pub use access_control::{AuthGuard, GuardMode, SessionCheck, AUTH_MIDDLEWARE};
