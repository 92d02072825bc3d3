//! Normalized run results
//!
//! One `RunResult` per completed execution, cached per tool id (a new run
//! overwrites the previous result). The persisted form mirrors this struct
//! field for field; every field deserializes from a default so records
//! written by older or newer builds stay readable without a schema version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tools::descriptor::Provenance;

/// Normalized outcome of one tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunResult {
    /// Tool id the result is cached under
    pub id: String,

    /// Display title at the time of the run
    pub title: String,

    /// Resolved command actually executed (post substitution)
    pub command: String,

    /// Resolved argument list actually executed
    pub args: Vec<String>,

    /// Captured stdout (size-capped, line endings normalized, trimmed)
    pub stdout: String,

    /// Captured stderr (size-capped, smaller cap)
    pub stderr: String,

    /// Structured payload, present only when interpretation is `structured`
    /// and decoding succeeded
    pub data: Option<serde_json::Value>,

    /// Decode failure message, present only when decoding failed
    pub parse_error: Option<String>,

    /// OS exit code; absent when the process was killed for timeout
    pub exit_code: Option<i32>,

    /// `false` whenever the run timed out or structured decoding failed,
    /// regardless of exit code
    pub success: bool,

    /// Stdout hit its capture cap
    pub stdout_truncated: bool,

    /// Stderr hit its capture cap
    pub stderr_truncated: bool,

    /// The configured timeout expired before the process closed
    pub timed_out: bool,

    /// When execution started
    pub started_at: DateTime<Utc>,

    /// Wall-clock run time in milliseconds
    pub duration_ms: u64,

    /// Provenance of the descriptor that produced this result
    pub provenance: Provenance,
}

impl Default for RunResult {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            command: String::new(),
            args: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            data: None,
            parse_error: None,
            exit_code: None,
            success: false,
            stdout_truncated: false,
            stderr_truncated: false,
            timed_out: false,
            started_at: DateTime::<Utc>::UNIX_EPOCH,
            duration_ms: 0,
            provenance: Provenance::User,
        }
    }
}

impl RunResult {
    /// Age of this result relative to `now`, in milliseconds
    ///
    /// Negative ages (clock adjustments) clamp to zero.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.started_at)
            .num_milliseconds()
            .max(0)
    }

    /// One-word status label for display surfaces
    pub fn status_label(&self) -> &'static str {
        if self.success {
            "OK"
        } else if self.timed_out {
            "TIMEOUT"
        } else {
            "FAILED"
        }
    }
}
