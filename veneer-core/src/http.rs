// HTTP request and response types

use crate::body::{BodyStream, StreamFactory};
use crate::{Error, Result};
use bytes::Bytes;
use http::{Method, Version};
use std::collections::HashMap;

/// Ordered, multi-valued HTTP headers.
///
/// Lookups ignore case; the name is kept as it was first given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// All values of a header, in insertion order. Empty when absent.
    pub fn get(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(index) => &self.entries[index].1,
            None => &[],
        }
    }

    /// First value of a header.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).first().map(String::as_str)
    }

    /// All values of a header joined with `", "`.
    pub fn get_line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Replace every value of a header.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index] = (name, vec![value]),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Add a value, keeping any existing ones.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub query_params: HashMap<String, String>,
    /// Parsed request body, when the body was a form or JSON object.
    pub body_params: HashMap<String, serde_json::Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Headers::new(),
            body: Vec::new(),
            query_params: HashMap::new(),
            body_params: HashMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn with_body_param(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.body_params.insert(name.into(), value.into());
        self
    }

    /// All values of a request header
    pub fn header(&self, name: &str) -> &[String] {
        self.headers.get(name)
    }

    pub fn header_line(&self, name: &str) -> String {
        self.headers.get_line(name)
    }

    /// Get a query parameter by name
    pub fn query(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Get a parsed body parameter by name
    pub fn body_param(&self, name: &str) -> Option<&serde_json::Value> {
        self.body_params.get(name)
    }
}

/// Canonical reason phrase for a status code, or `""` when there is none.
pub fn canonical_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

/// HTTP response value.
///
/// Mutators consume the response and hand back the changed value.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub reason_phrase: String,
    pub version: Version,
    pub headers: Headers,
    pub body: BodyStream,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason_phrase: canonical_reason(status).to_string(),
            version: Version::HTTP_11,
            headers: Headers::new(),
            body: BodyStream::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn internal_server_error() -> Self {
        Self::new(500)
    }

    /// Change the status. An empty reason phrase selects the canonical one.
    pub fn with_status(mut self, status: u16, reason_phrase: &str) -> Self {
        self.status = status;
        self.reason_phrase = if reason_phrase.is_empty() {
            canonical_reason(status).to_string()
        } else {
            reason_phrase.to_string()
        };
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_added_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    pub fn with_protocol_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_body(mut self, body: impl Into<BodyStream>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    pub fn protocol_version(&self) -> Version {
        self.version
    }

    pub fn header(&self, name: &str) -> &[String] {
        self.headers.get(name)
    }

    pub fn header_line(&self, name: &str) -> String {
        self.headers.get_line(name)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    /// Convert into an `http::Response` for hand-off to a transport.
    pub fn into_http(self) -> Result<http::Response<Bytes>> {
        let mut builder = http::Response::builder()
            .status(self.status)
            .version(self.version);

        for (name, values) in self.headers.iter() {
            for value in values {
                builder = builder.header(name, value.as_str());
            }
        }

        builder
            .body(self.body.to_bytes())
            .map_err(|e| Error::Internal(format!("Invalid HTTP response: {}", e)))
    }
}

/// Creates responses.
pub trait ResponseFactory: Send + Sync {
    fn create_response(&self, status: u16, reason_phrase: &str) -> HttpResponse;
}

/// Default factory producing responses with in-memory bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryFactory;

impl ResponseFactory for MemoryFactory {
    fn create_response(&self, status: u16, reason_phrase: &str) -> HttpResponse {
        HttpResponse::new(status).with_status(status, reason_phrase)
    }
}

impl StreamFactory for MemoryFactory {
    fn create_stream_from_buffer(&self, buffer: Vec<u8>) -> BodyStream {
        BodyStream::from_buffer(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/html");

        assert!(headers.contains("content-type"));
        assert_eq!(headers.get("CONTENT-TYPE"), &["text/html".to_string()]);
        assert_eq!(headers.iter().next().unwrap().0, "Content-Type");
    }

    #[test]
    fn test_headers_append_and_line() {
        let mut headers = Headers::new();
        headers.append("Accept", "text/html");
        headers.append("accept", "application/json");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get_line("Accept"), "text/html, application/json");
    }

    #[test]
    fn test_headers_set_replaces() {
        let mut headers = Headers::new();
        headers.append("X-A", "1");
        headers.append("X-A", "2");
        headers.set("x-a", "3");

        assert_eq!(headers.get("X-A"), &["3".to_string()]);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.set("X-A", "1");
        headers.remove("x-a");

        assert!(headers.is_empty());
        assert!(headers.get("X-A").is_empty());
    }

    #[test]
    fn test_response_default_reason() {
        let response = HttpResponse::ok();
        assert_eq!(response.reason_phrase(), "OK");
        assert_eq!(response.protocol_version(), Version::HTTP_11);

        let response = response.with_status(404, "");
        assert_eq!(response.reason_phrase(), "Not Found");

        let response = response.with_status(418, "Teapot");
        assert_eq!(response.reason_phrase(), "Teapot");
    }

    #[test]
    fn test_into_http() {
        let response = HttpResponse::ok()
            .with_header("Content-Type", "text/plain; charset=UTF-8")
            .with_added_header("X-Trace", "a")
            .with_added_header("X-Trace", "b")
            .with_body("hello");

        let converted = response.into_http().unwrap();
        assert_eq!(converted.status(), http::StatusCode::OK);
        assert_eq!(converted.headers().get_all("x-trace").iter().count(), 2);
        assert_eq!(converted.body().as_ref(), b"hello");
    }

    #[test]
    fn test_into_http_rejects_invalid_header() {
        let response = HttpResponse::ok().with_header("Bad Header", "x");
        assert!(response.into_http().is_err());
    }

    #[test]
    fn test_request_helpers() {
        let request = HttpRequest::get("/users")
            .with_header("Accept", "application/json")
            .with_query_param("format", "xml");

        assert_eq!(request.header("accept"), &["application/json".to_string()]);
        assert_eq!(request.query("format"), Some(&"xml".to_string()));
        assert_eq!(request.body_param("format"), None);
    }
}
