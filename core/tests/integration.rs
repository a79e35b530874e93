//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port with its own store, then
//! drives `SolowayClient` over real HTTP through the default ureq transport.
//! The store handle lets tests force failures and count requests.

use std::time::Duration;

use chrono::NaiveDate;
use mock_server::{Db, DEMO_CLIENT_GUID, DEMO_PASSWORD, DEMO_USERNAME};
use soloway_core::{ApiError, ClientConfig, Context, Credentials, SolowayClient};

/// Starts the mock server on a random port and returns its base URL.
fn start_server(db: Db) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, db).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client_for(base_url: &str, username: &str, password: &str) -> SolowayClient {
    let config = ClientConfig::new(base_url).with_timeout(Duration::from_secs(10));
    SolowayClient::new(config, Credentials::new(username, password))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn session_lifecycle() {
    let db = mock_server::seeded_db();
    let base_url = start_server(db.clone());
    let mut client = client_for(&base_url, DEMO_USERNAME, DEMO_PASSWORD);
    let ctx = Context::with_timeout(Duration::from_secs(10));

    // Step 1: login stores the session id issued by the server.
    client.login(&ctx).unwrap();
    let sid = client.session_token().unwrap().to_string();
    assert!(!sid.is_empty());

    // Step 2: whoami caches the account.
    let account = client.whoami(&ctx).unwrap();
    assert_eq!(account.username, DEMO_USERNAME);
    assert_eq!(account.client.guid, DEMO_CLIENT_GUID);

    // Step 3: placements of the account's client.
    let placements = client.get_placements(&ctx).unwrap();
    assert_eq!(placements.list.len(), 3);
    let ids: Vec<String> = placements.list.iter().map(|p| p.guid.clone()).collect();

    // Step 4: aggregated stat request is accepted and recorded as sent.
    client
        .get_placements_stat(&ctx, &ids, date(2024, 3, 1), date(2024, 3, 31), true)
        .unwrap();
    {
        let store = db.blocking_read();
        let recorded = store.stat_requests.last().unwrap();
        assert_eq!(recorded.placement_ids, ids);
        assert_eq!(recorded.start_date, date(2024, 3, 1));
        assert_eq!(recorded.stop_date, date(2024, 3, 31));
        assert_eq!(recorded.with_archived, 1);
    }

    // Step 5: per-day stat covers the inclusive range.
    let stat = client
        .get_placement_stat_by_day(&ctx, &ids[0], date(2024, 2, 27), date(2024, 3, 1))
        .unwrap();
    let days: Vec<NaiveDate> = stat.list.iter().map(|s| s.date).collect();
    assert_eq!(
        days,
        vec![date(2024, 2, 27), date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]
    );

    // Step 6: the session survives across calls.
    assert_eq!(client.session_token(), Some(sid.as_str()));
    assert_eq!(db.blocking_read().session_count(), 1);
}

#[test]
fn login_unknown_user_reports_status_text() {
    let base_url = start_server(mock_server::seeded_db());
    let mut client = client_for(&base_url, "nobody", "x");

    let err = client.login(&Context::background()).unwrap_err();

    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "401 Unauthorized");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(client.session_token().is_none());
}

#[test]
fn login_wrong_password_reports_error_field() {
    let base_url = start_server(mock_server::seeded_db());
    let mut client = client_for(&base_url, DEMO_USERNAME, "wrong");

    let err = client.login(&Context::background()).unwrap_err();

    assert!(matches!(&err, ApiError::Api { status: None, message } if message == "bad creds"));
    assert!(!client.is_authenticated());
}

#[test]
fn out_of_order_calls_never_reach_the_server() {
    let db = mock_server::seeded_db();
    let base_url = start_server(db.clone());
    let mut client = client_for(&base_url, DEMO_USERNAME, DEMO_PASSWORD);
    let ctx = Context::background();

    let err = client.whoami(&ctx).unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated));
    assert_eq!(db.blocking_read().requests, 0);

    client.login(&ctx).unwrap();
    let err = client.get_placements(&ctx).unwrap_err();
    assert!(matches!(err, ApiError::AccountInfoMissing));
    assert_eq!(db.blocking_read().requests, 1);
}

#[test]
fn every_operation_surfaces_non_200() {
    let db = mock_server::seeded_db();
    let base_url = start_server(db.clone());
    let mut client = client_for(&base_url, DEMO_USERNAME, DEMO_PASSWORD);
    let ctx = Context::background();
    client.login(&ctx).unwrap();
    client.whoami(&ctx).unwrap();

    db.blocking_write().forced_status = Some(503);

    let errors = vec![
        client.login(&ctx).unwrap_err(),
        client.whoami(&ctx).unwrap_err(),
        client.get_placements(&ctx).unwrap_err(),
        client
            .get_placements_stat(&ctx, &[], date(2024, 1, 1), date(2024, 1, 2), false)
            .unwrap_err(),
        client
            .get_placement_stat_by_day(&ctx, "p-0001", date(2024, 1, 1), date(2024, 1, 2))
            .unwrap_err(),
    ];
    for err in errors {
        assert!(err.is_api_error(), "got {err:?}");
        assert_eq!(err.status(), Some(503));
    }

    db.blocking_write().forced_status = None;
    assert_eq!(client.get_placements(&ctx).unwrap().list.len(), 3);
    assert_eq!(db.blocking_read().requests, 2 + 5 + 1);
}

#[test]
fn error_answers_are_drained_and_the_connection_reused() {
    let db = mock_server::seeded_db();
    let base_url = start_server(db.clone());
    let mut client = client_for(&base_url, DEMO_USERNAME, DEMO_PASSWORD);
    let ctx = Context::with_timeout(Duration::from_secs(10));
    client.login(&ctx).unwrap();
    client.whoami(&ctx).unwrap();

    db.blocking_write().forced_status = Some(503);
    for _ in 0..3 {
        let err = client.get_placements(&ctx).unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    db.blocking_write().forced_status = None;
    assert_eq!(client.get_placements(&ctx).unwrap().list.len(), 3);

    let store = db.blocking_read();
    assert_eq!(store.requests, 6);
    assert_eq!(store.connection_count(), 1);
}

#[test]
fn large_answers_are_read_in_full() {
    let base_url = start_server(mock_server::seeded_db());
    let mut client = client_for(&base_url, DEMO_USERNAME, DEMO_PASSWORD);
    let ctx = Context::background();
    client.login(&ctx).unwrap();

    // A millennium of daily rows is well past ureq's 10 MiB default.
    let stat = client
        .get_placement_stat_by_day(&ctx, "p-0001", date(1500, 1, 1), date(2499, 12, 31))
        .unwrap();

    assert_eq!(stat.list.first().unwrap().date, date(1500, 1, 1));
    assert_eq!(stat.list.last().unwrap().date, date(2499, 12, 31));
    assert!(stat.list.len() > 365_000);
}

#[test]
fn unreachable_host_is_a_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut client = client_for(&format!("http://127.0.0.1:{port}"), DEMO_USERNAME, DEMO_PASSWORD);

    let err = client.login(&Context::background()).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}
