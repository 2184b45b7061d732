//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `GraphQlClient` builds
//! `HttpRequest` values and parses `HttpResponse` values; a `Transport`
//! executes the actual I/O in between. Every GraphQL operation is sent as
//! a POST with a JSON body.

/// HTTP method for a request. GraphQL over HTTP only needs POST here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Non-2xx statuses are ordinary values here; interpreting them is the
/// client's job.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
