//! Health status holder
//!
//! The status code reported by `/health`. Read by every health probe and
//! replaced by administrative POST requests, so it lives in an atomic.

use std::sync::atomic::{AtomicU16, Ordering};

/// Status codes accepted by `set`
///
/// 1xx codes are informational and cannot be sent as a final response.
pub const VALID_STATUS: std::ops::RangeInclusive<u16> = 200..=599;

/// Atomic health status code, 200 until changed
#[derive(Debug)]
pub struct HealthState {
    status: AtomicU16,
}

impl HealthState {
    pub const fn new(status: u16) -> Self {
        Self {
            status: AtomicU16::new(status),
        }
    }

    pub fn get(&self) -> u16 {
        self.status.load(Ordering::Acquire)
    }

    /// Store a new status code, rejecting anything outside 200..=599
    pub fn set(&self, status: u16) -> Result<(), String> {
        if !VALID_STATUS.contains(&status) {
            return Err(format!("invalid status code: {status}"));
        }
        self.status.store(status, Ordering::Release);
        Ok(())
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new(200)
    }
}
