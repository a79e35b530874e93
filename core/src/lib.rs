//! Blocking client for the Soloway DSP advertising API.
//!
//! # Overview
//! `SolowayClient` logs in once, keeps the session token from the `X-Sid`
//! header, and issues the account, placement, and statistics requests of the
//! platform, decoding JSON answers into typed values.
//!
//! # Design
//! - Each operation has a `build_*` method producing a plain-data
//!   `HttpRequest`; a `Transport` executes it and the client interprets the
//!   `HttpResponse`. `UreqTransport` is the default transport.
//! - Host and timeout come from `ClientConfig`, so tests point the client at
//!   a local mock server.
//! - Every call takes a `Context` whose deadline bounds the exchange.
//! - Errors are typed (`ApiError`); nothing is retried and nothing aborts.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::SolowayClient;
pub use config::{ClientConfig, Credentials, DEFAULT_BASE_URL};
pub use context::Context;
pub use error::{ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{AccountInfo, ClientInfo, DayStat, Placement, PlacementsInfo, PlacementsStatByDay};
