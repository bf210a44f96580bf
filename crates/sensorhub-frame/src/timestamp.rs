use std::time::{SystemTime, UNIX_EPOCH};

use crate::cursor::FrameCursor;
use crate::error::Result;

/// Nanoseconds per unit of the frame-local timestamp offset (microseconds).
pub const NANOS_PER_OFFSET_TICK: i64 = 1_000;

/// Source of absolute host time.
pub trait Clock: Send + Sync {
    /// Current time in nanoseconds.
    fn now_ns(&self) -> u64;
}

/// Wall-clock time since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ns(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

/// Host-side anchor that frame-local offsets are added to.
///
/// Read by every sample decoded in a parse call; replaced at most once per
/// call, after the whole transfer has been walked.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    ns: u64,
}

impl TimeBase {
    pub fn new(ns: u64) -> Self {
        Self { ns }
    }

    pub fn as_nanos(&self) -> u64 {
        self.ns
    }

    /// Absolute timestamp for a signed microsecond offset from the base.
    pub fn resolve(&self, offset_us: i32) -> u64 {
        self.ns
            .saturating_add_signed(i64::from(offset_us) * NANOS_PER_OFFSET_TICK)
    }

    /// Read the 4-byte offset field at the cursor and resolve it.
    pub fn read_timestamp(&self, cursor: &mut FrameCursor<'_>) -> Result<u64> {
        let offset_us = cursor.read_i32_le()?;
        Ok(self.resolve(offset_us))
    }

    /// Re-anchor on the clock's current time.
    pub fn resync(&mut self, clock: &dyn Clock) {
        self.ns = clock.now_ns();
    }
}
