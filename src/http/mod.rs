//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, body decoding)
//!     → request.rs (method override, path, input, headers)
//!     → routing::Dispatcher (match, middleware, handler)
//!     → response.rs helpers build what handlers return
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{InputMap, Request, RequestBuilder, ServerParams, UploadedFile};
pub use server::HttpServer;
