//! Injected clock so that executors never read the wall clock directly
//! and tests can freeze time.

use chrono::{DateTime, Utc};

pub trait Clock {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used by the CLI.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}
