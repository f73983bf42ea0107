//! Error types for the secure clock

use thiserror::Error;

/// Result type alias using ClockError
pub type Result<T> = std::result::Result<T, ClockError>;

/// Errors that can occur while establishing or reading secure time
#[derive(Error, Debug)]
pub enum ClockError {
    /// The configured server list is empty
    #[error("no time servers configured")]
    NoServers,

    /// Every configured server failed to answer
    #[error("failed to reach any configured time server")]
    NoReachableServer,

    /// A single query to one server failed
    #[error("time query to {server} failed: {reason}")]
    Query { server: String, reason: String },

    /// The last successful reading is too old to trust
    #[error("time reading is stale ({age_secs}s old)")]
    Stale { age_secs: u64 },
}
