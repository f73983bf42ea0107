//! Clock readings and the shared cell that stores the latest one

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// A paired reading of the network clock and the local monotonic clock.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ClockReading {
    /// Wall-clock time reported by the time server.
    pub(crate) wall: DateTime<Utc>,
    /// Local monotonic reading taken after the server's response arrived.
    /// Capturing the monotonic clock second biases later estimates toward
    /// underestimating the true time.
    pub(crate) monotonic: Instant,
}

impl ClockReading {
    /// Pairs a server-reported wall time with the monotonic clock as of now.
    ///
    /// Call this immediately after the network response arrives.
    pub(crate) fn new(wall: DateTime<Utc>) -> Self {
        Self {
            wall,
            monotonic: Instant::now(),
        }
    }
}

/// A synchronized cell holding the latest clock reading.
///
/// Writers replace the whole reading; readers copy it out. Stored readings
/// are immutable.
#[derive(Clone)]
pub(crate) struct ReadingCell {
    inner: Arc<Mutex<ClockReading>>,
}

impl ReadingCell {
    pub(crate) fn new(reading: ClockReading) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reading)),
        }
    }

    pub(crate) fn get(&self) -> ClockReading {
        *self.inner.lock().unwrap()
    }

    pub(crate) fn put(&self, reading: ClockReading) {
        *self.inner.lock().unwrap() = reading;
    }
}
