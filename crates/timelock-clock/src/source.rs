//! Time sources
//!
//! The poller speaks to time servers through the [`TimeSource`] trait, so the
//! transport can be swapped without touching the polling or staleness logic.
//! The production source queries NTP servers over SNTP.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rsntp::AsyncSntpClient;

use crate::error::{ClockError, Result};

/// Trait for querying a remote time server.
#[async_trait]
pub trait TimeSource: Send + Sync {
    /// Queries the server at `addr` for the current wall-clock time.
    async fn query(&self, addr: &str) -> Result<DateTime<Utc>>;

    /// Get a description of this source (for logging)
    fn describe(&self) -> &str {
        "time source"
    }
}

/// SNTP-backed time source.
pub struct SntpTimeSource {
    client: AsyncSntpClient,
}

impl SntpTimeSource {
    /// Create a new SNTP time source
    pub fn new() -> Self {
        Self {
            client: AsyncSntpClient::new(),
        }
    }
}

impl Default for SntpTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeSource for SntpTimeSource {
    async fn query(&self, addr: &str) -> Result<DateTime<Utc>> {
        let query_err = |reason: String| ClockError::Query {
            server: addr.to_string(),
            reason,
        };

        let result = self
            .client
            .synchronize(addr)
            .await
            .map_err(|e| query_err(e.to_string()))?;
        result
            .datetime()
            .into_chrono_datetime()
            .map_err(|e| query_err(e.to_string()))
    }

    fn describe(&self) -> &str {
        "SNTP time source"
    }
}
