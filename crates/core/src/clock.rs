// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;

    /// Current time formatted as a cycle id: `YYYYMMDD-HHMMSS`.
    fn cycle_id(&self) -> crate::cycle::CycleId {
        crate::cycle::CycleId::from_epoch_ms(self.epoch_ms())
    }
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    epoch_ms: Arc<Mutex<u64>>,
    start: Instant,
    offset_ms: Arc<Mutex<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            epoch_ms: Arc::new(Mutex::new(1_700_000_000_000)),
            start: Instant::now(),
            offset_ms: Arc::new(Mutex::new(0)),
        }
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        *self.epoch_ms.lock() += ms;
        *self.offset_ms.lock() += ms;
    }

    pub fn set_epoch_ms(&self, ms: u64) {
        *self.epoch_ms.lock() = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + std::time::Duration::from_millis(*self.offset_ms.lock())
    }

    fn epoch_ms(&self) -> u64 {
        *self.epoch_ms.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances_both_now_and_epoch() {
        let clock = FakeClock::new();
        let e0 = clock.epoch_ms();
        let n0 = clock.now();
        clock.advance_ms(5_000);
        assert_eq!(clock.epoch_ms(), e0 + 5_000);
        assert!(clock.now() >= n0 + std::time::Duration::from_millis(5_000));
    }

    #[test]
    fn cycle_id_is_derived_from_epoch() {
        let clock = FakeClock::new();
        clock.set_epoch_ms(0);
        let id = clock.cycle_id();
        assert_eq!(id.as_str(), "19700101-000000");
    }
}
