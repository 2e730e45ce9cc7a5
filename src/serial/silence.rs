//! # Silence Monitor
//!
//! Tracks time since the last successful decode and reports a silent
//! source at most once per threshold window.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Liveness tracker for the serial source
#[derive(Debug)]
pub struct SilenceMonitor {
    threshold: Duration,
    window_start: Instant,
    last_fix: Option<DateTime<Utc>>,
}

impl SilenceMonitor {
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            threshold,
            window_start: now,
            last_fix: None,
        }
    }

    /// A sentence decoded successfully; restart the window
    pub fn record_fix(&mut self, now: Instant) {
        self.window_start = now;
        self.last_fix = Some(Utc::now());
    }

    /// Returns true when a full window elapsed without a fix
    ///
    /// Reporting opens a new window, so continuous silence is reported once
    /// per threshold interval.
    pub fn check(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.window_start) >= self.threshold {
            self.window_start = now;
            true
        } else {
            false
        }
    }

    /// Wall-clock time of the last successful decode
    pub fn last_fix(&self) -> Option<DateTime<Utc>> {
        self.last_fix
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}
