//! Demo application served by the `switchyard` binary.
//!
//! # Data Flow
//! ```text
//! build_dispatcher()
//!     → routes.rs (declare home, guest and member routes)
//!     → controllers.rs (bind controller factories)
//!     → AuthGuard bound as `auth` middleware
//!     → Dispatcher, ready to share
//! ```
//!
//! # Design Decisions
//! - No sessions or database: a caller counts as logged in when it sends the
//!   `x-user` header, which is all the guard needs to demonstrate both modes

pub mod controllers;
pub mod routes;

pub use controllers::{AuthController, DashboardController, HomeController};
pub use routes::{build_dispatcher, register_routes, USER_HEADER};
