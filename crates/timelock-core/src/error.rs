//! Error types for the timelock core

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using TimelockError
pub type Result<T> = std::result::Result<T, TimelockError>;

/// Errors that can occur while deriving or storing time keys
#[derive(Error, Debug)]
pub enum TimelockError {
    /// Requested time falls outside the served range
    #[error("time {requested} is outside the served range [{min}, {max}]")]
    OutOfRange {
        requested: DateTime<Utc>,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    },

    /// A root secret file exists but does not hold exactly 32 bytes
    #[error("secret file {path} is corrupted: expected {expected} bytes, found {found}")]
    CorruptSecret {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// Filesystem access to a secret file failed
    #[error("failed to access secret file {path}: {source}")]
    SecretIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem access to the secrets directory failed
    #[error("failed to initialize secrets directory {path}: {source}")]
    SecretsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The system RNG could not produce a fresh root secret
    #[error("insufficient entropy: {0}")]
    Entropy(String),

    /// Every candidate scalar drawn from the HKDF stream was rejected
    #[error("failed to generate a valid key in {0} attempts")]
    KeyAttemptsExhausted(usize),

    /// A configuration value could not be found in any source
    #[error("{name} could not be determined from any source")]
    ConfigUndetermined { name: String },

    /// Two configuration sources disagree on an already-pinned value
    #[error("inferred {name} differs from value in {source_name}: got {got:?}, want {want:?}")]
    ConfigConflict {
        name: String,
        source_name: String,
        got: String,
        want: String,
    },

    /// Reading or writing a configuration file failed
    #[error("failed to access config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PKI ID is not a valid UUID
    #[error("invalid PKI ID: {0}")]
    InvalidPkiId(#[from] uuid::Error),

    /// ASN.1 encoding or decoding of a key failed
    #[error("key encoding failed: {0}")]
    Encoding(String),
}
