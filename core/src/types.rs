//! Request and response payloads of the Soloway API.
//!
//! # Design
//! Response types are lenient: fields the platform may omit default to empty
//! values and unknown fields are ignored, so additions on the server side do
//! not break decoding. Request types serialize exactly the documented shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire format of every date sent to the platform.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of the login answer. A non-empty `error` means the login was refused.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub error: String,
}

/// Profile of the authenticated user, returned by `GET /api/whoami`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountInfo {
    pub username: String,
    pub client: ClientInfo,
}

/// Advertiser the user belongs to; its `guid` scopes placement queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientInfo {
    pub guid: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementsInfo {
    #[serde(default)]
    pub list: Vec<Placement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

/// Body of `POST /api/placements_stat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementsStatRequest {
    pub placement_ids: Vec<String>,
    pub start_date: String,
    pub stop_date: String,
    /// `1` to include archived placements, `0` otherwise.
    pub with_archived: u8,
}

impl PlacementsStatRequest {
    pub fn new(placement_ids: &[String], start: NaiveDate, stop: NaiveDate, with_archived: bool) -> Self {
        Self {
            placement_ids: placement_ids.to_vec(),
            start_date: format_date(start),
            stop_date: format_date(stop),
            with_archived: u8::from(with_archived),
        }
    }
}

/// Body of `POST /api/placements/{guid}/stat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: String,
    pub stop_date: String,
}

impl DateRange {
    pub fn new(start: NaiveDate, stop: NaiveDate) -> Self {
        Self {
            start_date: format_date(start),
            stop_date: format_date(stop),
        }
    }
}

/// Daily statistics of one placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlacementsStatByDay {
    #[serde(default)]
    pub list: Vec<DayStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayStat {
    pub date: NaiveDate,
    #[serde(default)]
    pub shows: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub cost: f64,
}
