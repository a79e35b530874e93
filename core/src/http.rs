//! HTTP exchange types shared by the request builders and the transport.
//!
//! # Design
//! Requests and responses are plain data. Builders on `SolowayClient` produce
//! `HttpRequest` values, a `Transport` executes them, and the parsers consume
//! the resulting `HttpResponse`. Keeping the exchange as data lets unit tests
//! inspect exactly what would go over the wire.

use std::time::Duration;

pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_SESSION: &str = "X-sid";
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Upper bound for the whole exchange, derived from the call's `Context`.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// A JSON request carrying `Accept`/`Content-Type` and, when given, the
    /// session header.
    pub fn json(method: HttpMethod, url: String, body: Option<String>, session: Option<&str>) -> Self {
        let mut headers = vec![
            (HEADER_ACCEPT.to_string(), APPLICATION_JSON.to_string()),
            (HEADER_CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
        ];
        if let Some(sid) = session {
            headers.push((HEADER_SESSION.to_string(), sid.to_string()));
        }
        Self {
            method,
            url,
            headers,
            body,
            timeout: None,
        }
    }

    /// Value of the first header named `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data. The body has been read to the
/// end by the transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Status line text in the `"401 Unauthorized"` form.
    pub fn status_text(&self) -> String {
        status_text(self.status)
    }
}

pub fn status_text(status: u16) -> String {
    match ureq::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        Some(reason) => format!("{status} {reason}"),
        None => status.to_string(),
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
