//! Telemetry for tool runs
//!
//! In-process audit collector. The execution engine notifies it
//! fire-and-forget on completion; a collector problem can never fail a run.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::tools::descriptor::RunReason;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        tool: String,
        reason: RunReason,
        timestamp: Instant,
    },
    RunCompleted {
        tool: String,
        success: bool,
        timed_out: bool,
        duration_ms: u64,
        timestamp: Instant,
    },
    RunDeduped {
        tool: String,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub runs_started: usize,
    pub runs_completed: usize,
    pub runs_succeeded: usize,
    pub runs_failed: usize,
    pub runs_timed_out: usize,
    pub runs_deduped: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<RunEvent>>>,
    stats: Arc<Mutex<RunStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(RunStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: RunEvent) {
        {
            let mut stats = self.stats.lock().unwrap();
            match &event {
                RunEvent::RunStarted { .. } => {
                    stats.runs_started += 1;
                }
                RunEvent::RunCompleted {
                    success, timed_out, ..
                } => {
                    stats.runs_completed += 1;
                    if *success {
                        stats.runs_succeeded += 1;
                    } else {
                        stats.runs_failed += 1;
                    }
                    if *timed_out {
                        stats.runs_timed_out += 1;
                    }
                }
                RunEvent::RunDeduped { .. } => {
                    stats.runs_deduped += 1;
                }
            }
        }

        let mut events = self.events.lock().unwrap();
        events.push(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> RunStats {
        self.stats.lock().unwrap().clone()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<RunEvent> {
        let events = self.events.lock().unwrap();
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Get elapsed time since the collector was created
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Calculate run success rate
    pub fn success_rate(&self) -> f64 {
        let stats = self.stats.lock().unwrap();
        if stats.runs_completed == 0 {
            1.0
        } else {
            stats.runs_succeeded as f64 / stats.runs_completed as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
