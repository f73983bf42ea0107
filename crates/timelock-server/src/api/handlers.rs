//! Request handlers for the time-key endpoints

use axum::extract::{Query, State};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use timelock_clock::SecureClock;
use timelock_core::{codec, KeyManager, TimelockError};

use crate::api::error::ApiError;
use crate::api::JsonLine;

/// Application state shared across handlers
pub struct AppState {
    /// Time-indexed key derivation over the secrets directory
    pub keys: KeyManager,
    /// Release gate for private keys
    pub clock: SecureClock,
}

/// Query parameters accepted by both key endpoints
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    /// Requested instant: integer Unix seconds or an RFC 3339 string
    pub time: Option<String>,

    /// Optional PKI filter; requests for a foreign PKI are not served
    pub pki_id: Option<String>,
}

/// Response for public key requests
#[derive(Debug, Serialize)]
pub struct GetPublicKeyResponse {
    #[serde(rename = "pkiName")]
    pub pki_name: String,
    #[serde(rename = "pkiID")]
    pub pki_id: String,
    /// Base64 DER SubjectPublicKeyInfo
    pub spki: String,
}

/// Response for private key requests
#[derive(Debug, Serialize)]
pub struct GetPrivateKeyResponse {
    #[serde(rename = "pkiName")]
    pub pki_name: String,
    #[serde(rename = "pkiID")]
    pub pki_id: String,
    /// Base64 DER PKCS #8 PrivateKeyInfo
    pub pkcs8: String,
}

/// Parses a time parameter, which may be either integer seconds since the
/// Unix epoch or an RFC 3339 string.
fn parse_time(s: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            ApiError::BadRequest(format!("Time {secs} is outside the representable range"))
        });
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }

    Err(ApiError::BadRequest(
        "time must be given either as integer seconds since the Unix epoch or an RFC 3339 string"
            .into(),
    ))
}

/// Rejects requests addressed to a PKI this server does not host.
fn check_pki_filter(keys: &KeyManager, pki_id: Option<&str>) -> Result<(), ApiError> {
    let Some(raw) = pki_id else {
        return Ok(());
    };
    let id = Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid UUID: {e}")))?;
    if id != keys.pki_id() {
        return Err(ApiError::NotFound(format!("Server does not have PKI {id}")));
    }
    Ok(())
}

/// Shared front half of both handlers: PKI filter, time parsing, key
/// derivation. `what` names the requested key kind in client-visible
/// internal-error messages.
fn fetch_key(
    state: &AppState,
    query: &KeyQuery,
    what: &str,
) -> Result<(DateTime<Utc>, p256::SecretKey), ApiError> {
    check_pki_filter(&state.keys, query.pki_id.as_deref())?;

    let raw = query
        .time
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("\"time\" parameter is required".into()))?;
    let t = parse_time(raw)?;

    match state.keys.key_for_time(t) {
        Ok(key) => Ok((t, key)),
        Err(TimelockError::OutOfRange { min, max, .. }) => Err(ApiError::BadRequest(format!(
            "Time out of range: must be between {} and {}",
            min.to_rfc3339(),
            max.to_rfc3339()
        ))),
        Err(e) => {
            error!(time = %t.to_rfc3339(), error = %e, "failed to retrieve key");
            Err(ApiError::Internal(format!("Server failed to retrieve {what}")))
        }
    }
}

/// Serve the public key for a time
///
/// GET /v0/get_public_key?time=<spec>[&pki_id=<uuid>]
///
/// Public keys are served for any time within the configured range,
/// future instants included.
pub async fn get_public_key(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeyQuery>,
) -> Result<JsonLine<GetPublicKeyResponse>, ApiError> {
    let (t, key) = fetch_key(&state, &query, "public key")?;

    let der = codec::encode_public_key_der(&key.public_key()).map_err(|e| {
        error!(time = %t.to_rfc3339(), error = %e, "failed to encode public key");
        ApiError::Internal("Server failed to retrieve public key".into())
    })?;

    Ok(JsonLine(GetPublicKeyResponse {
        pki_name: state.keys.name().to_string(),
        pki_id: state.keys.pki_id().to_string(),
        spki: STANDARD.encode(der),
    }))
}

/// Serve the private key for a past time
///
/// GET /v0/get_private_key?time=<spec>[&pki_id=<uuid>]
///
/// The release gate: private keys are disclosed only once the secure clock
/// confirms the requested instant lies in the past. A stale or unavailable
/// clock refuses release but never blocks public-key serving.
pub async fn get_private_key(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeyQuery>,
) -> Result<JsonLine<GetPrivateKeyResponse>, ApiError> {
    let (t, key) = fetch_key(&state, &query, "private key")?;

    let now = state.clock.now().map_err(|e| {
        error!(error = %e, "failed to determine the current time securely");
        ApiError::Internal("Server could not securely determine the current time".into())
    })?;
    if t > now {
        return Err(ApiError::Forbidden(
            "Server does not disclose private keys for future timestamps".into(),
        ));
    }

    let der = codec::encode_private_key_der(&key).map_err(|e| {
        error!(time = %t.to_rfc3339(), error = %e, "failed to encode private key");
        ApiError::Internal("Server failed to retrieve private key".into())
    })?;

    Ok(JsonLine(GetPrivateKeyResponse {
        pki_name: state.keys.name().to_string(),
        pki_id: state.keys.pki_id().to_string(),
        pkcs8: STANDARD.encode(der),
    }))
}
