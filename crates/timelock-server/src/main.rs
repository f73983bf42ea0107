//! Timelock Key Server Binary
//!
//! Runs the HTTP server that derives and releases time keys.

use std::env;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use timelock_clock::{SecureClock, SntpTimeSource};
use timelock_core::{KeyManager, PkiOptions};
use timelock_server::{create_router, AppState};

/// Reads an optional RFC 3339 time bound from the environment.
fn time_bound_from_env(var: &str) -> Option<DateTime<Utc>> {
    let raw = env::var(var).ok()?;
    let parsed = DateTime::parse_from_rfc3339(&raw)
        .unwrap_or_else(|e| panic!("{var} must be an RFC 3339 time: {e}"));
    Some(parsed.with_timezone(&Utc))
}

#[tokio::main]
async fn main() {
    // Initialize logging
    let log_level = env::var("TIMELOCK_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Configuration
    let port: u16 = env::var("TIMELOCK_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()
        .expect("TIMELOCK_PORT must be a valid port number");

    let nts_servers: Vec<String> = env::var("TIMELOCK_NTS_SERVERS")
        .expect("TIMELOCK_NTS_SERVERS must list at least one time server")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let secrets_dir = env::var("TIMELOCK_SECRETS_DIR")
        .expect("TIMELOCK_SECRETS_DIR must point at the secrets directory");

    let pki_name = env::var("TIMELOCK_PKI_NAME").ok();
    let pki_id: Option<Uuid> = env::var("TIMELOCK_PKI_ID")
        .ok()
        .map(|s| s.parse().expect("TIMELOCK_PKI_ID must be a valid UUID"));

    let min_time = time_bound_from_env("TIMELOCK_MIN_TIME")
        .unwrap_or_else(|| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let max_time = time_bound_from_env("TIMELOCK_MAX_TIME")
        .unwrap_or_else(|| Utc.with_ymd_and_hms(2049, 12, 31, 23, 59, 59).unwrap());

    // Secure time must be established before the server accepts requests.
    let clock = SecureClock::start(Arc::new(SntpTimeSource::new()), nts_servers)
        .await
        .expect("Failed to establish secure time");

    let keys = KeyManager::open(
        PkiOptions {
            name: pki_name,
            id: pki_id,
            min_time,
            max_time,
        },
        &secrets_dir,
    )
    .expect("Failed to open the secrets directory");

    info!(
        name = %keys.name(),
        pki_id = %keys.pki_id(),
        min_time = %min_time.to_rfc3339(),
        max_time = %max_time.to_rfc3339(),
        "PKI identity resolved"
    );

    // Create application state
    let state = Arc::new(AppState { keys, clock });

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "Timelock key server listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
