//! # Timelock Clock
//!
//! A secure clock for gating private-key release: wall-clock time attested by
//! a configured list of network time servers, carried forward between polls
//! by the local monotonic clock.
//!
//! ## Architecture
//!
//! - [`TimeSource`] is the transport seam: the production [`SntpTimeSource`]
//!   queries servers over SNTP, and [`MockTimeSource`] serves settable time
//!   in tests
//! - A background poller connects to the first responsive server, re-polls
//!   hourly (retrying every five minutes on failure), and fails over to
//!   another server after repeated failures
//! - [`SecureClock::now`] returns the last attested time plus the elapsed
//!   monotonic delta, and refuses once the reading is older than six hours
//!
//! Readings pair the server's answer with a monotonic timestamp taken after
//! the response arrived, so the estimate underestimates true time: the clock
//! prefers refusing a legitimate release over releasing early.

pub mod clock;
pub mod error;
pub mod mock;
mod poller;
mod reading;
pub mod source;

pub use clock::{SecureClock, STALE_THRESHOLD};
pub use error::{ClockError, Result};
pub use mock::MockTimeSource;
pub use source::{SntpTimeSource, TimeSource};
