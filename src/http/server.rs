//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that funnels every request into the dispatcher
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Decode query strings, urlencoded forms and multipart bodies into a `Request`
//! - Map dispatch errors to status codes
//! - Bind server to listener and drain on shutdown
//!
//! # Design Decisions
//! - One fallback handler; Axum does no routing of its own
//! - GET and HEAD bodies are never read
//! - Error details reach the client only when `app.debug` is set

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Query, State},
    http::{header, request::Parts, Method, StatusCode},
    response::{IntoResponse, Response},
    Form, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::SwitchyardConfig;
use crate::http::request::{InputMap, Request, ServerParams, UploadedFile};
use crate::observability::metrics::{self, DispatchLabel};
use crate::routing::{Dispatcher, Error, Outcome};

/// Application state injected into the fallback handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub debug: bool,
}

/// HTTP host for a frozen dispatcher.
pub struct HttpServer {
    router: Router,
    config: SwitchyardConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: SwitchyardConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher,
            debug: config.app.debug,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &SwitchyardConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            debug = self.config.app.debug,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SwitchyardConfig {
        &self.config
    }
}

/// Single entry point: decode the request, dispatch it, render the outcome.
async fn dispatch_handler(State(state): State<AppState>, request: axum::extract::Request) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let request = match decode_request(request).await {
        Ok(request) => request,
        Err(rejection) => {
            metrics::record_dispatch(&method, DispatchLabel::Failed, rejection.status().as_u16(), start);
            return rejection;
        }
    };

    match state.dispatcher.dispatch(&request) {
        Ok(outcome) => {
            let label = match &outcome {
                Outcome::Handled { .. } => DispatchLabel::Handled,
                Outcome::Halted { .. } => DispatchLabel::Halted,
            };
            let response = outcome.into_response();
            metrics::record_dispatch(&method, label, response.status().as_u16(), start);
            response
        }
        Err(e) => {
            let label = if e.is_not_found() {
                DispatchLabel::NotFound
            } else {
                DispatchLabel::Failed
            };
            let response = error_response(&e, state.debug);
            metrics::record_dispatch(&method, label, response.status().as_u16(), start);
            response
        }
    }
}

/// Render a dispatch error. Not-found is routine; anything else is logged.
fn error_response(error: &Error, debug: bool) -> Response {
    let status = error.status();
    if !error.is_not_found() {
        tracing::error!(error = %error, status = %status, "Dispatch failed");
    }

    let body = if debug {
        error.to_string()
    } else {
        status.canonical_reason().unwrap_or("Error").to_string()
    };
    (status, body).into_response()
}

async fn decode_request(request: axum::extract::Request) -> Result<Request, Response> {
    let (parts, body) = request.into_parts();
    let server = server_params(&parts);

    let query = Query::<InputMap>::try_from_uri(&parts.uri)
        .map(|Query(query)| query)
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Ignoring undecodable query string");
            InputMap::new()
        });

    if parts.method == Method::GET || parts.method == Method::HEAD {
        return Ok(Request::new(server, query, InputMap::new(), Vec::new()));
    }

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let request = axum::extract::Request::from_parts(parts, body);

    let (fields, files) = if content_type.starts_with("multipart/form-data") {
        read_multipart(request).await?
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(fields) = Form::<InputMap>::from_request(request, &())
            .await
            .map_err(IntoResponse::into_response)?;
        (fields, Vec::new())
    } else {
        (InputMap::new(), Vec::new())
    };

    Ok(Request::new(server, query, fields, files))
}

async fn read_multipart(
    request: axum::extract::Request,
) -> Result<(InputMap, Vec<UploadedFile>), Response> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(IntoResponse::into_response)?;

    let mut fields = InputMap::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        if file_name.is_some() {
            let data = field.bytes().await.map_err(IntoResponse::into_response)?;
            files.push(UploadedFile {
                field: name,
                file_name,
                content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(IntoResponse::into_response)?;
            fields.insert(name, value);
        }
    }

    Ok((fields, files))
}

fn server_params(parts: &Parts) -> ServerParams {
    ServerParams {
        method: Some(parts.method.as_str().to_string()),
        uri: Some(parts.uri.to_string()),
        headers: parts.headers.clone(),
    }
}
