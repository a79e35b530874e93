//! Error types for the Soloway API client.
//!
//! # Design
//! Failures fall into four kinds: the transport failed, the server answered
//! with an API error (non-200 status or an `error` field in the body), an
//! operation ran before its prerequisite step, or a payload could not be
//! (de)serialized. Each kind has its own variant so callers match on the
//! variant instead of comparing message strings.

use thiserror::Error;

/// Boxed source error from the HTTP transport.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `SolowayClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or connection failure reported by the transport.
    #[error("transport failed: {0}")]
    Transport(#[source] TransportError),

    /// The caller's deadline expired before or during the exchange.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The platform rejected the request.
    ///
    /// `status` is set for non-200 answers and `message` then holds the status
    /// text (`401 Unauthorized`). For a 200 answer whose body carries an
    /// `error` field, `status` is `None` and `message` is that field.
    #[error("api error: {message}")]
    Api { status: Option<u16>, message: String },

    /// An authenticated operation was attempted before a successful login.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A placement operation was attempted before `whoami` populated the
    /// account info.
    #[error("account info not fetched")]
    AccountInfoMissing,

    /// The login answer was 200 but carried no `X-Sid` header.
    #[error("login response carried no session token")]
    MissingSessionToken,

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[source] serde_json::Error),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(#[source] serde_json::Error),
}

impl ApiError {
    /// True for errors reported by the platform itself.
    pub fn is_api_error(&self) -> bool {
        matches!(self, ApiError::Api { .. })
    }

    /// True when the client was used out of order (no login, no whoami).
    pub fn is_auth_state(&self) -> bool {
        matches!(
            self,
            ApiError::NotAuthenticated | ApiError::AccountInfoMissing | ApiError::MissingSessionToken
        )
    }

    /// HTTP status of a rejected request, if the platform sent one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => *status,
            _ => None,
        }
    }
}

/// Errors raised while reading client configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidVar { name: &'static str, value: String },
}
