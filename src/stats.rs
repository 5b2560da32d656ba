//! In-memory counters describing what the client has collected and sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for one client.
#[derive(Debug)]
pub struct TelemetryStats {
    /// Events accepted into the buffer
    events_recorded: AtomicU64,
    /// Batches taken out of the buffer and handed to the transport
    batches_flushed: AtomicU64,
    /// Session reports handed to the transport
    session_reports: AtomicU64,
    /// Pushes that failed (batch or session)
    push_failures: AtomicU64,
    /// Successful mode pulls
    mode_resolutions: AtomicU64,
    /// When the client was created
    started_at: DateTime<Utc>,
}

impl TelemetryStats {
    /// Create a new set of counters.
    pub fn new() -> Self {
        Self {
            events_recorded: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            session_reports: AtomicU64::new(0),
            push_failures: AtomicU64::new(0),
            mode_resolutions: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    /// Record an event accepted into the buffer.
    pub fn record_event(&self) {
        self.events_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a flushed batch.
    pub fn record_batch_flushed(&self) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session report.
    pub fn record_session_report(&self) {
        self.session_reports.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed push.
    pub fn record_push_failure(&self) {
        self.push_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a resolved mode.
    pub fn record_mode_resolution(&self) {
        self.mode_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_recorded: self.events_recorded.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            session_reports: self.session_reports.load(Ordering::Relaxed),
            push_failures: self.push_failures.load(Ordering::Relaxed),
            mode_resolutions: self.mode_resolutions.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Telemetry Statistics:\n\
             - Events recorded: {}\n\
             - Batches flushed: {}\n\
             - Session reports: {}\n\
             - Push failures: {}\n\
             - Mode resolutions: {}\n\
             - Uptime: {} seconds",
            stats.events_recorded,
            stats.batches_flushed,
            stats.session_reports,
            stats.push_failures,
            stats.mode_resolutions,
            stats.uptime_secs
        )
    }
}

impl Default for TelemetryStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`TelemetryStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub events_recorded: u64,
    pub batches_flushed: u64,
    pub session_reports: u64,
    pub push_failures: u64,
    pub mode_resolutions: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = TelemetryStats::new();

        for _ in 0..7 {
            stats.record_event();
        }
        stats.record_batch_flushed();
        stats.record_push_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.events_recorded, 7);
        assert_eq!(snapshot.batches_flushed, 1);
        assert_eq!(snapshot.push_failures, 1);
        assert_eq!(snapshot.session_reports, 0);
    }

    #[test]
    fn test_summary_format() {
        let stats = TelemetryStats::new();
        let summary = stats.summary();

        assert!(summary.contains("Events recorded: 0"));
        assert!(summary.contains("Batches flushed"));
        assert!(summary.contains("Push failures"));
    }
}
