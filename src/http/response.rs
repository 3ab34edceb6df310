//! Response helpers for handlers and middleware.
//!
//! # Responsibilities
//! - Build the common terminal responses (redirect, text, html, json)
//! - Keep handlers free of header boilerplate
//!
//! # Design Decisions
//! - Redirects use `302 Found`, the status a bare `Location` header implies
//! - JSON is serialized with `serde_json`; serialization failures become 500

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;

/// `302 Found` pointing at `location`.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location = %location, "Invalid redirect target");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    (status, body.into()).into_response()
}

pub fn html(status: StatusCode, body: impl Into<String>) -> Response {
    (status, Html(body.into())).into_response()
}

/// Serialize `data` as a JSON body with the given status.
pub fn json<T: Serialize>(status: StatusCode, data: &T) -> Response {
    match serde_json::to_vec(data) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize JSON response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
