//! Stateful client for the Soloway DSP API.
//!
//! # Design
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a parse step that consumes the `HttpResponse`; the
//! round-trip in between goes through the client's `Transport`. Builders for
//! authenticated endpoints check their preconditions, so an operation used
//! out of order fails before any request exists.
//!
//! The client owns its session token and account info and mutates them in
//! `login` and `whoami`, which take `&mut self`. Share it behind a mutex or
//! keep one client per session.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{
    ClientConfig, Credentials, PATH_CLIENTS, PATH_LOGIN, PATH_PLACEMENTS, PATH_PLACEMENTS_STAT, PATH_WHOAMI,
};
use crate::context::Context;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HEADER_SESSION};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    AccountInfo, DateRange, LoginRequest, LoginResponse, PlacementsInfo, PlacementsStatByDay, PlacementsStatRequest,
};

/// Blocking client for the Soloway DSP API.
#[derive(Debug)]
pub struct SolowayClient<T = UreqTransport> {
    config: ClientConfig,
    credentials: Credentials,
    transport: T,
    session: Option<String>,
    account: Option<AccountInfo>,
}

impl SolowayClient<UreqTransport> {
    pub fn new(config: ClientConfig, credentials: Credentials) -> Self {
        Self::with_transport(config, credentials, UreqTransport::new())
    }
}

impl<T: Transport> SolowayClient<T> {
    pub fn with_transport(config: ClientConfig, credentials: Credentials, transport: T) -> Self {
        Self {
            config,
            credentials,
            transport,
            session: None,
            account: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Account info cached by the last successful `whoami`.
    pub fn account_info(&self) -> Option<&AccountInfo> {
        self.account.as_ref()
    }

    /// Switches to another user. The session and cached account info belong to
    /// the previous user and are dropped.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
        self.session = None;
        self.account = None;
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Logs in with the stored credentials and keeps the session token from
    /// the `X-Sid` response header.
    pub fn login(&mut self, ctx: &Context) -> Result<(), ApiError> {
        let request = self.build_login()?;
        let response = self.round_trip(ctx, request)?;
        let session = parse_login(response)?;
        info!(username = %self.credentials.username, "logged in");
        self.session = Some(session);
        Ok(())
    }

    /// Fetches the profile of the logged-in user and caches it.
    pub fn whoami(&mut self, ctx: &Context) -> Result<&AccountInfo, ApiError> {
        let request = self.build_whoami()?;
        let body = self.send(ctx, request)?;
        let account: AccountInfo = decode(&body)?;
        info!(username = %account.username, client = %account.client.guid, "fetched account info");
        Ok(self.account.insert(account))
    }

    /// Lists the placements of the account's client.
    pub fn get_placements(&self, ctx: &Context) -> Result<PlacementsInfo, ApiError> {
        let request = self.build_placements()?;
        let body = self.send(ctx, request)?;
        decode(&body)
    }

    /// Requests aggregated statistics for `placement_ids`. The platform answers
    /// with a bare JSON string, so success is the only result.
    pub fn get_placements_stat(
        &self,
        ctx: &Context,
        placement_ids: &[String],
        start_date: NaiveDate,
        stop_date: NaiveDate,
        with_archived: bool,
    ) -> Result<(), ApiError> {
        let request = self.build_placements_stat(placement_ids, start_date, stop_date, with_archived)?;
        let body = self.send(ctx, request)?;
        let acknowledgement: String = decode(&body)?;
        debug!(%acknowledgement, "placements stat accepted");
        Ok(())
    }

    /// Per-day statistics of one placement between two dates, inclusive.
    pub fn get_placement_stat_by_day(
        &self,
        ctx: &Context,
        placement_guid: &str,
        start_date: NaiveDate,
        stop_date: NaiveDate,
    ) -> Result<PlacementsStatByDay, ApiError> {
        let request = self.build_placement_stat_by_day(placement_guid, start_date, stop_date)?;
        let body = self.send(ctx, request)?;
        decode(&body)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_login(&self) -> Result<HttpRequest, ApiError> {
        let body = encode(&LoginRequest {
            username: &self.credentials.username,
            password: &self.credentials.password,
        })?;
        Ok(HttpRequest::json(
            HttpMethod::Post,
            self.config.url(PATH_LOGIN),
            Some(body),
            None,
        ))
    }

    pub fn build_whoami(&self) -> Result<HttpRequest, ApiError> {
        let sid = self.require_session()?;
        Ok(HttpRequest::json(
            HttpMethod::Get,
            self.config.url(PATH_WHOAMI),
            None,
            Some(sid),
        ))
    }

    pub fn build_placements(&self) -> Result<HttpRequest, ApiError> {
        let account = self.require_account()?;
        let sid = self.require_session()?;
        let path = format!("{PATH_CLIENTS}/{}/placements", account.client.guid);
        Ok(HttpRequest::json(HttpMethod::Get, self.config.url(&path), None, Some(sid)))
    }

    pub fn build_placements_stat(
        &self,
        placement_ids: &[String],
        start_date: NaiveDate,
        stop_date: NaiveDate,
        with_archived: bool,
    ) -> Result<HttpRequest, ApiError> {
        self.require_account()?;
        let sid = self.require_session()?;
        let body = encode(&PlacementsStatRequest::new(
            placement_ids,
            start_date,
            stop_date,
            with_archived,
        ))?;
        Ok(HttpRequest::json(
            HttpMethod::Post,
            self.config.url(PATH_PLACEMENTS_STAT),
            Some(body),
            Some(sid),
        ))
    }

    pub fn build_placement_stat_by_day(
        &self,
        placement_guid: &str,
        start_date: NaiveDate,
        stop_date: NaiveDate,
    ) -> Result<HttpRequest, ApiError> {
        let sid = self.require_session()?;
        let body = encode(&DateRange::new(start_date, stop_date))?;
        let path = format!("{PATH_PLACEMENTS}/{placement_guid}/stat");
        Ok(HttpRequest::json(
            HttpMethod::Post,
            self.config.url(&path),
            Some(body),
            Some(sid),
        ))
    }

    // -----------------------------------------------------------------------
    // Round-trip
    // -----------------------------------------------------------------------

    fn require_session(&self) -> Result<&str, ApiError> {
        match self.session.as_deref() {
            Some(sid) if !sid.is_empty() => Ok(sid),
            _ => Err(ApiError::NotAuthenticated),
        }
    }

    fn require_account(&self) -> Result<&AccountInfo, ApiError> {
        self.account.as_ref().ok_or(ApiError::AccountInfoMissing)
    }

    fn round_trip(&self, ctx: &Context, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        request.timeout = ctx.effective_timeout(self.config.timeout)?;
        self.transport.execute(request)
    }

    /// Executes `request` and returns the raw body of a 200 answer.
    fn send(&self, ctx: &Context, request: HttpRequest) -> Result<Vec<u8>, ApiError> {
        let response = self.round_trip(ctx, request)?;
        check_status(&response)?;
        Ok(response.body)
    }
}

/// Any status but 200 is a failure carrying the status text.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(ApiError::Api {
        status: Some(response.status),
        message: response.status_text(),
    })
}

/// Validates a login answer and extracts its session token.
fn parse_login(response: HttpResponse) -> Result<String, ApiError> {
    check_status(&response)?;
    let body: LoginResponse = decode(&response.body)?;
    if !body.error.is_empty() {
        return Err(ApiError::Api {
            status: None,
            message: body.error,
        });
    }
    match response.header(HEADER_SESSION) {
        Some(sid) if !sid.is_empty() => Ok(sid.to_string()),
        _ => Err(ApiError::MissingSessionToken),
    }
}

fn encode<B: Serialize>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(ApiError::SerializationError)
}

fn decode<R: DeserializeOwned>(body: &[u8]) -> Result<R, ApiError> {
    serde_json::from_slice(body).map_err(ApiError::DeserializationError)
}
