//! Route declarations for the demo application.

use std::sync::Arc;

use crate::http::request::Request;
use crate::routing::{
    action, ControllerRegistry, Dispatcher, MiddlewareRef, MiddlewareRegistry, RouteOptions,
    RouteTable,
};
use crate::security::{AuthGuard, AUTH_MIDDLEWARE};

use super::controllers::{AuthController, DashboardController, HomeController};

/// Header whose presence marks a caller as logged in.
pub const USER_HEADER: &str = "x-user";

/// Declare every route of the application on `routes`.
pub fn register_routes(routes: &mut RouteTable) {
    routes.get("/", action("HomeController", "index"), RouteOptions::named("home"));

    let guest = RouteOptions::new().middleware(MiddlewareRef::named(AUTH_MIDDLEWARE).arg("guest"));
    routes.group(guest, |routes| {
        routes.get("/login", action("AuthController", "login"), RouteOptions::named("login"));
        routes.post("/login", action("AuthController", "loginPost"), RouteOptions::new());
        routes.get("/register", action("AuthController", "register"), RouteOptions::named("register"));
        routes.post("/register", action("AuthController", "registerPost"), RouteOptions::new());
    });

    let auth = RouteOptions::new().middleware(MiddlewareRef::named(AUTH_MIDDLEWARE).arg("auth"));
    routes.group(auth, |routes| {
        routes.get("/logout", action("AuthController", "logout"), RouteOptions::new());
        routes.get(
            "/dashboard",
            action("DashboardController", "index"),
            RouteOptions::named("dashboard"),
        );
    });
}

/// Build the frozen dispatcher the binary serves.
pub fn build_dispatcher() -> Dispatcher {
    let mut routes = RouteTable::new();
    register_routes(&mut routes);

    let mut controllers = ControllerRegistry::new();
    controllers
        .bind_default::<HomeController>("HomeController")
        .bind_default::<AuthController>("AuthController")
        .bind_default::<DashboardController>("DashboardController");

    let mut middleware = MiddlewareRegistry::new();
    AuthGuard::register(
        &mut middleware,
        Arc::new(|request: &Request| request.header(USER_HEADER).is_some()),
    );

    Dispatcher::new(routes)
        .with_controllers(controllers)
        .with_middleware(middleware)
}
