//! Background poller that keeps the reading cell fresh

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::{ClockError, Result};
use crate::reading::{ClockReading, ReadingCell};
use crate::source::TimeSource;

/// How often to request a new absolute time after a successful poll.
const POLL_PERIOD: Duration = Duration::from_secs(60 * 60);

/// How soon to retry after a failed poll.
const RETRY_PERIOD: Duration = Duration::from_secs(5 * 60);

/// How many consecutive failures to allow before re-selecting a server.
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// State for regularly polling a time server.
pub(crate) struct Poller {
    source: Arc<dyn TimeSource>,
    addrs: Vec<String>,
    current: usize,
    cell: ReadingCell,
}

impl Poller {
    /// Connects to the first responsive server and stores an initial reading.
    pub(crate) async fn connect(source: Arc<dyn TimeSource>, addrs: Vec<String>) -> Result<Self> {
        if addrs.is_empty() {
            return Err(ClockError::NoServers);
        }
        let (current, reading) = select_server(source.as_ref(), &addrs).await?;
        Ok(Self {
            source,
            addrs,
            current,
            cell: ReadingCell::new(reading),
        })
    }

    /// Returns the cell that the poller writes its readings to.
    pub(crate) fn cell(&self) -> ReadingCell {
        self.cell.clone()
    }

    /// Updates the reading cell with new data, returning true on success.
    ///
    /// When `reselect` is set, the full server list is walked again first,
    /// possibly landing on a different server.
    async fn poll_once(&mut self, reselect: bool) -> bool {
        if reselect {
            match select_server(self.source.as_ref(), &self.addrs).await {
                Ok((current, reading)) => {
                    self.current = current;
                    self.cell.put(reading);
                    return true;
                }
                Err(e) => {
                    error!(error = %e, "failed to re-establish a time server session");
                    return false;
                }
            }
        }

        let addr = &self.addrs[self.current];
        match self.source.query(addr).await {
            Ok(wall) => {
                self.cell.put(ClockReading::new(wall));
                true
            }
            Err(e) => {
                error!(server = %addr, error = %e, "time query failed");
                false
            }
        }
    }

    /// Periodically refreshes the reading cell. Never returns.
    pub(crate) async fn run(mut self) {
        let mut consecutive_failures: u32 = 0;
        loop {
            let delay = if consecutive_failures > 0 {
                RETRY_PERIOD
            } else {
                POLL_PERIOD
            };
            tokio::time::sleep(delay).await;

            if self.poll_once(consecutive_failures > MAX_CONSECUTIVE_FAILURES).await {
                consecutive_failures = 0;
            } else {
                consecutive_failures += 1;
            }
        }
    }
}

/// Walks the address list in order and returns the first server that
/// answers, together with the reading it produced.
async fn select_server(
    source: &dyn TimeSource,
    addrs: &[String],
) -> Result<(usize, ClockReading)> {
    for (i, addr) in addrs.iter().enumerate() {
        match source.query(addr).await {
            Ok(wall) => {
                // Pair the monotonic clock with the response immediately.
                let reading = ClockReading::new(wall);
                info!(server = %addr, source = source.describe(), "connected to time server");
                return Ok((i, reading));
            }
            Err(e) => warn!(server = %addr, error = %e, "failed to reach time server"),
        }
    }
    Err(ClockError::NoReachableServer)
}
