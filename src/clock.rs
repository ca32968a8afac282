//! Wall-clock sources for `now`.
//!
//! Anything that reads the current time takes a [`Clock`], so tests can pin the instant.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::calendar::Civil;

/// Provides the current instant as microseconds since 1970-01-01T00:00:00.
pub trait Clock {
    fn unix_micros(&self) -> i64;

    /// Broken-down fields of the current instant.
    fn civil(&self) -> Civil {
        let micros = self.unix_micros();
        log::trace!("resolved now to {micros}us since the epoch");
        Civil::from_unix_micros(micros)
    }
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_micros(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => since.as_micros() as i64,
            Err(err) => -(err.duration().as_micros() as i64),
        }
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl FixedClock {
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds * 1_000_000)
    }
}

impl Clock for FixedClock {
    fn unix_micros(&self) -> i64 {
        self.0
    }
}

impl<F> Clock for F
where
    F: Fn() -> i64,
{
    fn unix_micros(&self) -> i64 {
        self()
    }
}
