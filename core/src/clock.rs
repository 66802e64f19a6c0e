//! Clock abstraction for validity checks and update stamps.

use chrono::{DateTime, Utc};

/// Source of the current instant.
///
/// The engines read the clock for validity-window checks and for stamping
/// `updated_at`. Injecting it keeps time-dependent guards deterministic in
/// tests; see `mocks::FixedClock`.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock backed by [`Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
