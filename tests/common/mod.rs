//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use switchyard::config::SwitchyardConfig;
use switchyard::routing::{ChainDecision, Dispatcher, Middleware};
use switchyard::{HttpServer, Request, Shutdown};
use tokio::net::TcpListener;

/// Appends its label to a shared log and lets the request through.
pub struct Recorder {
    pub label: &'static str,
    pub log: Arc<Mutex<Vec<&'static str>>>,
}

impl Middleware for Recorder {
    fn handle(&self, _request: &Request) -> ChainDecision {
        self.log.lock().unwrap().push(self.label);
        ChainDecision::Continue
    }
}

/// Halts every request with `403`.
pub struct Forbid;

impl Middleware for Forbid {
    fn handle(&self, _request: &Request) -> ChainDecision {
        ChainDecision::Halt((axum::http::StatusCode::FORBIDDEN, "forbidden").into_response())
    }
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Serve `dispatcher` on an ephemeral port until the returned `Shutdown` fires.
pub async fn start_server(
    config: SwitchyardConfig,
    dispatcher: Dispatcher,
) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = HttpServer::new(config, Arc::new(dispatcher));

    let handle = tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown, handle)
}
