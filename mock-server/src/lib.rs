use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    serve::ListenerExt,
    Json, Router,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "demo-password";
pub const DEMO_CLIENT_GUID: &str = "client-0001";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientInfo {
    pub guid: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub client: ClientInfo,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    pub guid: String,
    pub name: String,
    pub archived: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacementsInfo {
    pub list: Vec<Placement>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DayStat {
    pub date: NaiveDate,
    pub shows: u64,
    pub clicks: u64,
    pub cost: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacementsStatByDay {
    pub list: Vec<DayStat>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub error: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementsStatRequest {
    pub placement_ids: Vec<String>,
    pub start_date: NaiveDate,
    pub stop_date: NaiveDate,
    pub with_archived: u8,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub stop_date: NaiveDate,
}

struct User {
    password: String,
    account: Account,
}

/// In-memory state of the emulated platform.
#[derive(Default)]
pub struct Store {
    users: HashMap<String, User>,
    placements: HashMap<String, Vec<Placement>>,
    sessions: HashMap<String, String>,
    /// Requests that reached the server, including rejected ones.
    pub requests: usize,
    /// Bodies accepted by `POST /api/placements_stat`, oldest first.
    pub stat_requests: Vec<PlacementsStatRequest>,
    /// When set, every route answers with this status code.
    pub forced_status: Option<u16>,
    /// TCP connections accepted by `run_with`.
    pub connections: Arc<AtomicUsize>,
}

impl Store {
    /// One demo account with three placements, the last one archived.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.add_user(
            DEMO_USERNAME,
            DEMO_PASSWORD,
            ClientInfo {
                guid: DEMO_CLIENT_GUID.to_string(),
                name: "Acme Media".to_string(),
            },
        );
        store.placements.insert(
            DEMO_CLIENT_GUID.to_string(),
            vec![
                placement("p-0001", "Homepage banner", false),
                placement("p-0002", "Sidebar", false),
                placement("p-0003", "Spring promo", true),
            ],
        );
        store
    }

    pub fn add_user(&mut self, username: &str, password: &str, client: ClientInfo) {
        self.users.insert(
            username.to_string(),
            User {
                password: password.to_string(),
                account: Account {
                    username: username.to_string(),
                    client,
                },
            },
        );
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn placement(guid: &str, name: &str, archived: bool) -> Placement {
    Placement {
        guid: guid.to_string(),
        name: name.to_string(),
        archived,
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn seeded_db() -> Db {
    Arc::new(RwLock::new(Store::seeded()))
}

pub fn app() -> Router {
    app_with(seeded_db())
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/whoami", get(whoami))
        .route("/api/clients/{guid}/placements", get(placements))
        .route("/api/placements_stat", post(placements_stat))
        .route("/api/placements/{guid}/stat", post(placement_stat_by_day))
        .layer(middleware::from_fn_with_state(db.clone(), gate))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, seeded_db()).await
}

pub async fn run_with(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    let connections = db.read().await.connections.clone();
    let listener = listener.tap_io(move |_| {
        connections.fetch_add(1, Ordering::SeqCst);
    });
    axum::serve(listener, app_with(db)).await
}

/// Counts every request and applies the forced status, if any.
async fn gate(State(db): State<Db>, request: Request, next: Next) -> Response {
    let forced = {
        let mut store = db.write().await;
        store.requests += 1;
        store.forced_status
    };
    debug!(method = %request.method(), uri = %request.uri(), "request");
    match forced {
        Some(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, "forced failure").into_response()
        }
        None => next.run(request).await,
    }
}

async fn session_account(db: &Db, headers: &HeaderMap) -> Result<Account, StatusCode> {
    let sid = headers
        .get("x-sid")
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let store = db.read().await;
    let username = store.sessions.get(sid).ok_or(StatusCode::UNAUTHORIZED)?;
    store
        .users
        .get(username)
        .map(|user| user.account.clone())
        .ok_or(StatusCode::UNAUTHORIZED)
}

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> Result<Response, StatusCode> {
    let mut store = db.write().await;
    let user = store.users.get(&input.username).ok_or(StatusCode::UNAUTHORIZED)?;
    if user.password != input.password {
        info!(username = %input.username, "login refused");
        return Ok(Json(LoginResponse {
            username: String::new(),
            error: "bad creds".to_string(),
        })
        .into_response());
    }
    let sid = Uuid::new_v4().to_string();
    store.sessions.insert(sid.clone(), input.username.clone());
    info!(username = %input.username, "login accepted");
    Ok((
        [("X-Sid", sid)],
        Json(LoginResponse {
            username: input.username,
            error: String::new(),
        }),
    )
        .into_response())
}

async fn whoami(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Account>, StatusCode> {
    session_account(&db, &headers).await.map(Json)
}

async fn placements(
    State(db): State<Db>,
    Path(guid): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PlacementsInfo>, StatusCode> {
    let account = session_account(&db, &headers).await?;
    if account.client.guid != guid {
        return Err(StatusCode::NOT_FOUND);
    }
    let store = db.read().await;
    let list = store.placements.get(&guid).cloned().unwrap_or_default();
    Ok(Json(PlacementsInfo { list }))
}

async fn placements_stat(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<PlacementsStatRequest>,
) -> Result<Json<String>, StatusCode> {
    session_account(&db, &headers).await?;
    if input.with_archived > 1 || input.start_date > input.stop_date {
        return Err(StatusCode::BAD_REQUEST);
    }
    db.write().await.stat_requests.push(input);
    Ok(Json("ok".to_string()))
}

async fn placement_stat_by_day(
    State(db): State<Db>,
    Path(guid): Path<String>,
    headers: HeaderMap,
    Json(range): Json<DateRange>,
) -> Result<Json<PlacementsStatByDay>, StatusCode> {
    let account = session_account(&db, &headers).await?;
    let store = db.read().await;
    let owned = store
        .placements
        .get(&account.client.guid)
        .is_some_and(|list| list.iter().any(|p| p.guid == guid));
    if !owned {
        return Err(StatusCode::NOT_FOUND);
    }
    if range.start_date > range.stop_date {
        return Err(StatusCode::BAD_REQUEST);
    }
    let list = range
        .start_date
        .iter_days()
        .take_while(|date| *date <= range.stop_date)
        .map(day_stat)
        .collect();
    Ok(Json(PlacementsStatByDay { list }))
}

/// Deterministic figures so tests can assert on them.
fn day_stat(date: NaiveDate) -> DayStat {
    let shows = 1000 + u64::from(date.ordinal()) * 10;
    let clicks = shows / 50;
    DayStat {
        date,
        shows,
        clicks,
        cost: clicks as f64 * 0.5,
    }
}
