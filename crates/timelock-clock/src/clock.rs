//! The secure clock itself

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{ClockError, Result};
use crate::poller::Poller;
use crate::reading::ReadingCell;
use crate::source::TimeSource;

/// How old network time measurements are allowed to be.
pub const STALE_THRESHOLD: Duration = Duration::from_secs(6 * 60 * 60);

/// Network-attested secure clock.
///
/// Estimates the current time as the last server-reported time plus the
/// elapsed monotonic delta, so rewinding the host's realtime clock cannot
/// move the estimate forward. Cheap to clone; all clones share one reading
/// cell.
#[derive(Clone)]
pub struct SecureClock {
    cell: ReadingCell,
}

impl SecureClock {
    /// Starts a secure clock over the given servers.
    ///
    /// Connects to the first responsive address, stores an initial reading,
    /// and spawns a background task that re-polls for the lifetime of the
    /// process, failing over between servers as needed.
    pub async fn start(source: Arc<dyn TimeSource>, addrs: Vec<String>) -> Result<Self> {
        let poller = Poller::connect(source, addrs).await?;
        let cell = poller.cell();
        tokio::spawn(poller.run());
        Ok(Self { cell })
    }

    /// Returns a secure estimate of the current time.
    ///
    /// The estimate errs on the side of underestimating the true time: the
    /// monotonic half of each reading is captured after the network response
    /// arrived. Fails when the last successful reading is older than
    /// [`STALE_THRESHOLD`].
    pub fn now(&self) -> Result<DateTime<Utc>> {
        let reading = self.cell.get();

        let delta = reading.monotonic.elapsed();
        if delta >= STALE_THRESHOLD {
            return Err(ClockError::Stale {
                age_secs: delta.as_secs(),
            });
        }
        let delta = match chrono::Duration::from_std(delta) {
            Ok(d) => d,
            Err(_) => {
                return Err(ClockError::Stale {
                    age_secs: delta.as_secs(),
                })
            }
        };
        Ok(reading.wall + delta)
    }
}
