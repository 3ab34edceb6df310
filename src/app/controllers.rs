//! Controllers for the demo application.

use axum::http::StatusCode;
use axum::response::Response;

use crate::http::request::Request;
use crate::http::response::{html, redirect};
use crate::routing::{Controller, RouteMatch};

use super::routes::USER_HEADER;

#[derive(Debug, Default)]
pub struct HomeController;

impl Controller for HomeController {
    fn responds_to(&self, action: &str) -> bool {
        action == "index"
    }

    fn call(&self, _action: &str, _request: &Request, _route: &RouteMatch) -> Response {
        html(
            StatusCode::OK,
            page("Welcome", "<p>Rendered via controller method.</p><a href=\"/login\">Log in</a>"),
        )
    }
}

/// Login, registration and logout.
#[derive(Debug, Default)]
pub struct AuthController;

impl AuthController {
    const ACTIONS: [&'static str; 5] = ["login", "loginPost", "register", "registerPost", "logout"];

    fn login_form(&self) -> Response {
        html(
            StatusCode::OK,
            page(
                "Log in",
                "<form method=\"post\" action=\"/login\">\
                 <input name=\"email\" type=\"email\"><input name=\"password\" type=\"password\">\
                 <button>Log in</button></form>",
            ),
        )
    }

    fn register_form(&self) -> Response {
        html(
            StatusCode::OK,
            page(
                "Register",
                "<form method=\"post\" action=\"/register\">\
                 <input name=\"name\"><input name=\"email\" type=\"email\">\
                 <input name=\"password\" type=\"password\"><button>Register</button></form>",
            ),
        )
    }

    fn login_post(&self, request: &Request) -> Response {
        let email = request.input_or("email", "").trim();
        let password = request.input_or("password", "");

        if email.is_empty() || password.is_empty() {
            tracing::debug!("Login rejected: missing credentials");
            return redirect("/login");
        }

        tracing::info!(email = %email, "User logged in");
        redirect("/dashboard")
    }

    fn register_post(&self, request: &Request) -> Response {
        let name = request.input_or("name", "").trim();
        let email = request.input_or("email", "").trim();
        let password = request.input_or("password", "");

        if name.is_empty() || email.is_empty() || password.is_empty() {
            tracing::debug!("Registration rejected: missing fields");
            return redirect("/register");
        }
        if !looks_like_email(email) {
            tracing::debug!(email = %email, "Registration rejected: invalid email");
            return redirect("/register");
        }

        tracing::info!(email = %email, "User registered");
        redirect("/login")
    }
}

impl Controller for AuthController {
    fn responds_to(&self, action: &str) -> bool {
        Self::ACTIONS.contains(&action)
    }

    fn call(&self, action: &str, request: &Request, _route: &RouteMatch) -> Response {
        match action {
            "login" => self.login_form(),
            "loginPost" => self.login_post(request),
            "register" => self.register_form(),
            "registerPost" => self.register_post(request),
            _ => redirect("/login"),
        }
    }
}

#[derive(Debug, Default)]
pub struct DashboardController;

impl Controller for DashboardController {
    fn responds_to(&self, action: &str) -> bool {
        action == "index"
    }

    fn call(&self, _action: &str, request: &Request, _route: &RouteMatch) -> Response {
        let user = escape(request.header_or(USER_HEADER, "member"));
        html(
            StatusCode::OK,
            page("Dashboard", &format!("<p>Welcome back, {user}.</p><a href=\"/logout\">Log out</a>")),
        )
    }
}

fn page(title: &str, body: &str) -> String {
    format!("<!doctype html><html><head><title>{title}</title></head><body><h1>{title}</h1>{body}</body></html>")
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_check() {
        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("ada"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada@localhost"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"x\" & y</b>"), "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;");
    }

    #[test]
    fn test_auth_actions() {
        let controller = AuthController;
        assert!(controller.responds_to("loginPost"));
        assert!(!controller.responds_to("destroy"));
    }
}
