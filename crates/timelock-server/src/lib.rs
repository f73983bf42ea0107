//! # Timelock Server
//!
//! HTTP front end for the timelock key server: derives a P-256 key pair for
//! any requested instant, serves the public half freely, and releases the
//! private half only once the secure clock confirms the instant lies in the
//! past.
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /v0/get_public_key?time=<spec>[&pki_id=<uuid>]` - Public key for a
//!   time; `<spec>` is integer Unix seconds or an RFC 3339 string
//! - `GET /v0/get_private_key?time=<spec>[&pki_id=<uuid>]` - Private key for
//!   a past time; future times are refused with 403
//!
//! Success bodies are JSON with base64 DER key material; error bodies are
//! plain text. Every body is newline terminated and every response allows
//! cross-origin reads.

pub mod api;

pub use api::handlers::AppState;
pub use api::create_router;
