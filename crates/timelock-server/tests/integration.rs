//! End-to-end tests for the timelock key server
//!
//! Each test boots the full router on an ephemeral listener, backed by a
//! fresh secrets directory and a mock time source, and drives it over real
//! HTTP.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::{tempdir, TempDir};
use uuid::Uuid;

use timelock_clock::{MockTimeSource, SecureClock};
use timelock_core::{codec, KeyManager, PkiOptions};
use timelock_server::{create_router, AppState};

/// Long enough away from now to be definitively in the past or the future.
const LONG_ENOUGH_SECS: i64 = 10;

fn serving_options() -> PkiOptions {
    PkiOptions {
        name: Some("Integration Test".into()),
        id: None,
        min_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        max_time: Utc.with_ymd_and_hms(2049, 12, 31, 23, 59, 59).unwrap(),
    }
}

struct TestServer {
    base_url: String,
    pki_id: Uuid,
    _dir: TempDir,
}

/// Boots a server whose secure clock tracks the host clock via the mock
/// source, and returns its base URL.
async fn start_server() -> TestServer {
    let dir = tempdir().unwrap();

    let source = Arc::new(MockTimeSource::fixed(Utc::now()));
    let clock = SecureClock::start(source, vec!["mock.example".into()])
        .await
        .unwrap();
    let keys = KeyManager::open(serving_options(), dir.path()).unwrap();
    let pki_id = keys.pki_id();

    let state = Arc::new(AppState { keys, clock });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        pki_id,
        _dir: dir,
    }
}

fn past_time() -> DateTime<Utc> {
    Utc::now() - chrono::Duration::seconds(LONG_ENOUGH_SECS)
}

fn future_time() -> DateTime<Utc> {
    Utc::now() + chrono::Duration::seconds(LONG_ENOUGH_SECS)
}

#[tokio::test]
async fn public_key_parses_as_spki() {
    let server = start_server().await;

    let resp = reqwest::get(format!(
        "{}/v0/get_public_key?time={}",
        server.base_url,
        past_time().timestamp()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let text = resp.text().await.unwrap();
    assert!(text.ends_with('\n'));

    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["pkiName"], "Integration Test");
    assert_eq!(body["pkiID"], server.pki_id.to_string());

    let der = STANDARD.decode(body["spki"].as_str().unwrap()).unwrap();
    codec::parse_public_key_der(&der).unwrap();
}

#[tokio::test]
async fn released_private_key_matches_served_public_key() {
    let server = start_server().await;
    let t = past_time().timestamp();

    let public: serde_json::Value = reqwest::get(format!(
        "{}/v0/get_public_key?time={t}",
        server.base_url
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    let private: serde_json::Value = reqwest::get(format!(
        "{}/v0/get_private_key?time={t}",
        server.base_url
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    let spki = STANDARD.decode(public["spki"].as_str().unwrap()).unwrap();
    let pkcs8 = STANDARD.decode(private["pkcs8"].as_str().unwrap()).unwrap();

    let public_key = codec::parse_public_key_der(&spki).unwrap();
    let private_key = codec::parse_private_key_der(&pkcs8).unwrap();
    assert_eq!(private_key.public_key(), public_key);
}

#[tokio::test]
async fn future_private_key_is_refused() {
    let server = start_server().await;

    let resp = reqwest::get(format!(
        "{}/v0/get_private_key?time={}",
        server.base_url,
        future_time().timestamp()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 403);

    let text = resp.text().await.unwrap();
    assert_eq!(
        text,
        "Server does not disclose private keys for future timestamps\n"
    );
}

#[tokio::test]
async fn future_public_key_is_served() {
    let server = start_server().await;

    let resp = reqwest::get(format!(
        "{}/v0/get_public_key?time={}",
        server.base_url,
        future_time().timestamp()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn out_of_range_times_are_bad_requests() {
    let server = start_server().await;
    let opts = serving_options();

    for t in [
        opts.min_time - chrono::Duration::seconds(1),
        opts.max_time + chrono::Duration::seconds(1),
    ] {
        let resp = reqwest::get(format!(
            "{}/v0/get_public_key?time={}",
            server.base_url,
            t.timestamp()
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), 400);

        let text = resp.text().await.unwrap();
        assert!(text.starts_with("Time out of range"));
        assert!(text.ends_with('\n'));
    }
}

#[tokio::test]
async fn foreign_pki_id_is_not_found() {
    let server = start_server().await;

    let resp = reqwest::get(format!(
        "{}/v0/get_private_key?pki_id={}&time={}",
        server.base_url,
        Uuid::new_v4(),
        past_time().timestamp()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn own_pki_id_is_accepted() {
    let server = start_server().await;

    let resp = reqwest::get(format!(
        "{}/v0/get_public_key?pki_id={}&time={}",
        server.base_url,
        server.pki_id,
        past_time().timestamp()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn malformed_parameters_are_bad_requests() {
    let server = start_server().await;

    // Missing time.
    let resp = reqwest::get(format!("{}/v0/get_public_key", server.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Unparsable time.
    let resp = reqwest::get(format!(
        "{}/v0/get_public_key?time=a-while-ago",
        server.base_url
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 400);

    // Unparsable UUID.
    let resp = reqwest::get(format!(
        "{}/v0/get_public_key?pki_id=not-a-uuid&time={}",
        server.base_url,
        past_time().timestamp()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn rfc3339_and_unix_seconds_name_the_same_key() {
    let server = start_server().await;
    let t = past_time();

    let by_secs: serde_json::Value = reqwest::get(format!(
        "{}/v0/get_public_key?time={}",
        server.base_url,
        t.timestamp()
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    let by_rfc3339: serde_json::Value = reqwest::get(format!(
        "{}/v0/get_public_key?time={}",
        server.base_url,
        t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    assert_eq!(by_secs["spki"], by_rfc3339["spki"]);
}

#[tokio::test]
async fn conflicting_name_fails_before_listening() {
    let dir = tempdir().unwrap();

    let mut opts = serving_options();
    KeyManager::open(opts.clone(), dir.path()).unwrap();

    opts.name = Some("A Different Name".into());
    assert!(KeyManager::open(opts, dir.path()).is_err());
}
