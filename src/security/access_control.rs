//! Access control middleware.
//! Keeps anonymous callers out of member pages and members out of guest pages.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::http::request::Request;
use crate::http::response::redirect;
use crate::routing::{ChainDecision, Middleware, MiddlewareRegistry};

/// Name the guard is bound under in a [`MiddlewareRegistry`].
pub const AUTH_MIDDLEWARE: &str = "auth";

/// Answers "is this caller logged in?".
pub type SessionCheck = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Which callers the guard lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardMode {
    /// Only logged-in callers; others go to the login page.
    #[default]
    Auth,
    /// Only anonymous callers; logged-in ones go to the dashboard.
    Guest,
}

impl FromStr for GuardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(GuardMode::Auth),
            "guest" => Ok(GuardMode::Guest),
            other => Err(format!("unknown guard mode {other:?}")),
        }
    }
}

#[derive(Clone)]
pub struct AuthGuard {
    mode: GuardMode,
    is_logged_in: SessionCheck,
    login_path: String,
    home_path: String,
}

impl AuthGuard {
    pub fn new(mode: GuardMode, is_logged_in: SessionCheck) -> Self {
        Self {
            mode,
            is_logged_in,
            login_path: "/login".to_string(),
            home_path: "/dashboard".to_string(),
        }
    }

    /// Build from route arguments: none means `auth`, else the first is the mode.
    pub fn from_args(args: &[String], is_logged_in: SessionCheck) -> Result<Self, String> {
        let mode = match args.first() {
            Some(mode) => mode.parse()?,
            None => GuardMode::Auth,
        };
        Ok(Self::new(mode, is_logged_in))
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_home_path(mut self, path: impl Into<String>) -> Self {
        self.home_path = path.into();
        self
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    /// Bind the guard under [`AUTH_MIDDLEWARE`], so routes can reference it
    /// as `auth` or `auth:guest`.
    pub fn register(registry: &mut MiddlewareRegistry, is_logged_in: SessionCheck) {
        registry.bind(AUTH_MIDDLEWARE, move |args: &[String]| {
            AuthGuard::from_args(args, is_logged_in.clone())
        });
    }
}

impl fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGuard")
            .field("mode", &self.mode)
            .field("login_path", &self.login_path)
            .field("home_path", &self.home_path)
            .finish_non_exhaustive()
    }
}

impl Middleware for AuthGuard {
    fn handle(&self, request: &Request) -> ChainDecision {
        let logged_in = (self.is_logged_in)(request);

        match (self.mode, logged_in) {
            (GuardMode::Auth, false) => {
                tracing::debug!(path = %request.path(), "Anonymous caller sent to login");
                ChainDecision::Halt(redirect(&self.login_path))
            }
            (GuardMode::Guest, true) => {
                tracing::debug!(path = %request.path(), "Logged-in caller sent home");
                ChainDecision::Halt(redirect(&self.home_path))
            }
            _ => ChainDecision::Continue,
        }
    }

    fn name(&self) -> &str {
        AUTH_MIDDLEWARE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::MiddlewareRef;
    use axum::http::{header, StatusCode};

    fn has_user_header() -> SessionCheck {
        Arc::new(|req: &Request| req.header("x-user").is_some())
    }

    fn location(decision: ChainDecision) -> String {
        match decision {
            ChainDecision::Halt(res) => {
                assert_eq!(res.status(), StatusCode::FOUND);
                res.headers()[header::LOCATION].to_str().unwrap().to_string()
            }
            ChainDecision::Continue => panic!("expected a redirect"),
        }
    }

    #[test]
    fn test_auth_mode() {
        let guard = AuthGuard::new(GuardMode::Auth, has_user_header());

        let anonymous = Request::builder().uri("/dashboard").build();
        assert_eq!(location(guard.handle(&anonymous)), "/login");

        let member = Request::builder().uri("/dashboard").header("X-User", "ada").build();
        assert!(guard.handle(&member).is_continue());
    }

    #[test]
    fn test_guest_mode() {
        let guard = AuthGuard::new(GuardMode::Guest, has_user_header());

        let anonymous = Request::builder().uri("/login").build();
        assert!(guard.handle(&anonymous).is_continue());

        let member = Request::builder().uri("/login").header("x-user", "ada").build();
        assert_eq!(location(guard.handle(&member)), "/dashboard");
    }

    #[test]
    fn test_custom_paths() {
        let guard = AuthGuard::new(GuardMode::Auth, has_user_header()).with_login_path("/signin");
        let anonymous = Request::builder().uri("/").build();
        assert_eq!(location(guard.handle(&anonymous)), "/signin");
    }

    #[test]
    fn test_from_args() {
        let guard = AuthGuard::from_args(&[], has_user_header()).unwrap();
        assert_eq!(guard.mode(), GuardMode::Auth);

        let guard = AuthGuard::from_args(&["guest".to_string()], has_user_header()).unwrap();
        assert_eq!(guard.mode(), GuardMode::Guest);

        let err = AuthGuard::from_args(&["admin".to_string()], has_user_header()).unwrap_err();
        assert!(err.contains("admin"));
    }

    #[test]
    fn test_registry_binding() {
        let mut registry = MiddlewareRegistry::new();
        AuthGuard::register(&mut registry, has_user_header());
        assert!(registry.contains(AUTH_MIDDLEWARE));

        let guest = registry
            .resolve(&MiddlewareRef::named("auth").arg("guest"))
            .unwrap();
        assert_eq!(guest.name(), "auth");

        let err = registry
            .resolve(&MiddlewareRef::named("auth").arg("root"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("root"));
    }
}
