//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only seam that touches I/O. `UreqTransport` is a
//! blocking ureq agent with status-as-error disabled, so 4xx/5xx answers come
//! back as `HttpResponse` data and status interpretation stays with the
//! client. All requests share one pooled agent; a deadline is applied as
//! per-request config. Every response body is read to the end before
//! `execute` returns, which releases the connection on all paths.

use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Default transport backed by a ureq `Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

/// Upper bound on a response body. Daily statistics over long ranges exceed
/// ureq's 10 MiB default.
pub const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

/// Applies the request's headers and timeout to a ureq builder.
fn prepare<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match request.timeout {
        Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
        None => builder,
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");

        let result = match request.method {
            HttpMethod::Get => prepare(self.agent.get(&request.url), &request).call(),
            HttpMethod::Post => {
                let builder = prepare(self.agent.post(&request.url), &request);
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let response = result.map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        // Reading to the end hands the connection back to the agent's pool.
        let mut body = response.into_body();
        let body = match body.with_config().limit(MAX_BODY_BYTES).read_to_vec() {
            Ok(bytes) => bytes,
            // The status already decides the outcome of a failed exchange.
            Err(err) if status != 200 => {
                warn!(status, error = %err, "failed to drain error response body");
                Vec::new()
            }
            Err(err) => return Err(map_ureq_error(err)),
        };

        debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse { status, headers, body })
    }
}

fn map_ureq_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => ApiError::DeadlineExceeded,
        other => ApiError::Transport(Box::new(other)),
    }
}
