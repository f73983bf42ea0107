//! Mock Time Source
//!
//! For testing purposes - serves a settable wall-clock time.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{ClockError, Result};
use crate::source::TimeSource;

/// Mock time source for testing
///
/// Serves whatever wall-clock time it was last given. Addresses of the form
/// `fail:<reason>` return an error with the given reason, so tests can
/// exercise failover and retry paths.
pub struct MockTimeSource {
    wall: Mutex<DateTime<Utc>>,
}

impl MockTimeSource {
    /// Create a mock source that reports the given wall-clock time
    pub fn fixed(wall: DateTime<Utc>) -> Self {
        Self {
            wall: Mutex::new(wall),
        }
    }

    /// Change the wall-clock time reported by subsequent queries
    pub fn set(&self, wall: DateTime<Utc>) {
        *self.wall.lock().unwrap() = wall;
    }
}

#[async_trait]
impl TimeSource for MockTimeSource {
    async fn query(&self, addr: &str) -> Result<DateTime<Utc>> {
        if let Some(reason) = addr.strip_prefix("fail:") {
            return Err(ClockError::Query {
                server: addr.to_string(),
                reason: reason.to_string(),
            });
        }
        Ok(*self.wall.lock().unwrap())
    }

    fn describe(&self) -> &str {
        "mock time source"
    }
}
