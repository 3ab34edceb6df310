//! Request model handed to middleware and handlers.
//!
//! # Responsibilities
//! - Capture method, path, query/body input, uploads and headers once
//! - Apply the `_method` override for HTML forms
//! - Expose read-only accessors; nothing is mutable after construction
//!
//! # Design Decisions
//! - Method is normalized to uppercase before parsing
//! - The override is evaluated once at construction, only for POST
//! - Path keeps the raw (undecoded) form, minus query string and fragment
//! - Header collection is best-effort: unparsable lines are skipped, never fatal
//! - Session or "current user" data lives outside the request

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};

/// Body field consulted for method override.
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

/// Flat key/value input, as decoded from a query string or form body.
pub type InputMap = HashMap<String, String>;

/// Server-side metadata about the inbound request.
#[derive(Debug, Clone, Default)]
pub struct ServerParams {
    /// Raw request method. Missing means `GET`.
    pub method: Option<String>,

    /// Raw request target. Missing means `/`.
    pub uri: Option<String>,

    pub headers: HeaderMap,
}

/// A file received in a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was submitted under.
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Immutable snapshot of one inbound HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: InputMap,
    body: InputMap,
    files: Vec<UploadedFile>,
    headers: HeaderMap,
}

impl Request {
    /// Build a request from its four raw sources.
    pub fn new(
        server: ServerParams,
        query: InputMap,
        body: InputMap,
        files: Vec<UploadedFile>,
    ) -> Self {
        let raw_method = server.method.as_deref().unwrap_or("GET");
        let mut method = parse_method(raw_method).unwrap_or_else(|| {
            tracing::debug!(method = %raw_method, "Unparsable request method, assuming GET");
            Method::GET
        });

        if method == Method::POST {
            if let Some(requested) = body.get(METHOD_OVERRIDE_FIELD) {
                match parse_method(requested) {
                    Some(overridden) => method = overridden,
                    None => {
                        tracing::debug!(requested = %requested, "Ignoring invalid method override")
                    }
                }
            }
        }

        Self {
            method,
            path: extract_path(server.uri.as_deref().unwrap_or("/")),
            query,
            body,
            files,
            headers: server.headers,
        }
    }

    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Effective method, after override.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query merged with body input; body wins on key collision.
    pub fn all(&self) -> InputMap {
        let mut merged = self.query.clone();
        merged.extend(self.body.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Input value from the body, falling back to the query string.
    pub fn input(&self, key: &str) -> Option<&str> {
        self.body
            .get(key)
            .or_else(|| self.query.get(key))
            .map(String::as_str)
    }

    pub fn input_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.input(key).unwrap_or(default)
    }

    /// Query string value only.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Header value by case-insensitive name. Non UTF-8 values count as absent.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    pub fn header_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.header(key).unwrap_or(default)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }
}

/// Builder for [`Request`], mostly for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    server: ServerParams,
    query: InputMap,
    body: InputMap,
    files: Vec<UploadedFile>,
}

impl RequestBuilder {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.server.method = Some(method.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.server.uri = Some(uri.into());
        self
    }

    /// Add a header. Invalid names or values are dropped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        insert_header(&mut self.server.headers, name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a body (form) field.
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    pub fn file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn build(self) -> Request {
        Request::new(self.server, self.query, self.body, self.files)
    }
}

/// Collect raw header lines into a map, skipping anything unparsable.
pub fn headers_from_pairs<'a, I>(pairs: I) -> HeaderMap
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        insert_header(&mut headers, name, value);
    }
    headers
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.append(name, value);
        }
        _ => tracing::debug!(header = %name, "Skipping unparsable header"),
    }
}

fn parse_method(raw: &str) -> Option<Method> {
    let upper = raw.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return None;
    }
    Method::from_bytes(upper.as_bytes()).ok()
}

fn extract_path(uri: &str) -> String {
    let path = match uri.parse::<Uri>() {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => uri
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}
