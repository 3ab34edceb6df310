//! Switchyard: an HTTP request router and dispatcher library.
//!
//! Routes are declared once on a [`routing::RouteTable`], frozen into a
//! [`routing::Dispatcher`] and served through the Axum host in [`http`].

pub mod app;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::SwitchyardConfig;
pub use http::{HttpServer, Request};
pub use lifecycle::Shutdown;
pub use routing::{Dispatcher, Outcome, RouteMatch, RouteOptions, RouteTable};
