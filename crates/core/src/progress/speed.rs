//! Rolling download-rate computation.

use std::time::Instant;

use super::ProgressEvent;

/// Rolling download-rate state for one job.
///
/// Seeded at construction so the first event measures from job start. The
/// reading only advances when the byte count strictly increased over a
/// non-zero interval; on equal or decreasing bytes the caller keeps the
/// previous display, so the rate never flickers to zero between events.
#[derive(Debug)]
pub struct SpeedTracker {
    prev_at: Instant,
    prev_bytes: f64,
}

impl SpeedTracker {
    pub fn new() -> Self {
        Self {
            prev_at: Instant::now(),
            prev_bytes: 0.0,
        }
    }

    /// Feeds one event; returns a fresh display string when the rate advanced.
    pub fn update(&mut self, event: &ProgressEvent) -> Option<String> {
        let elapsed = event.at.duration_since(self.prev_at).as_secs_f64();
        if elapsed <= 0.0 || event.downloaded_bytes <= self.prev_bytes {
            return None;
        }
        let bytes_per_sec = (event.downloaded_bytes - self.prev_bytes) / elapsed;
        self.prev_at = event.at;
        self.prev_bytes = event.downloaded_bytes;
        Some(format!("{:.2} Mbps", bytes_per_sec * 8.0 / 1_000_000.0))
    }
}

impl Default for SpeedTracker {
    fn default() -> Self {
        Self::new()
    }
}
