//! # Timelock Core
//!
//! Time-indexed key derivation for the timelock key server: every wall-clock
//! second maps deterministically to a P-256 key pair, rooted in per-hour
//! secrets persisted on disk.
//!
//! ## Key Concepts
//!
//! - **Root secret**: 32 random bytes covering one hour-long interval,
//!   created on first request and immutable afterwards
//! - **Derivation**: HKDF-SHA-256 keyed by the root secret, with the
//!   requested second as the info parameter
//! - **PKI identity**: a human-readable name and a UUID, reconciled between
//!   startup options and files in the secrets directory
//!
//! ## Invariants
//!
//! 1. The key for a time is a pure function of the root secret and the
//!    second; any two requests for the same UTC second return byte-identical
//!    keys
//! 2. A root secret, once written, is never modified, deleted, or
//!    regenerated; corruption is surfaced, not papered over
//! 3. The PKI name and ID, once persisted, are immutable; conflicting
//!    startup options fail fast

pub mod codec;
pub mod config;
pub mod derive;
pub mod error;
mod fsutil;
pub mod manager;
pub mod secrets;

pub use error::{Result, TimelockError};
pub use manager::{KeyManager, PkiOptions};
pub use secrets::{SecretStore, SECRET_SIZE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
