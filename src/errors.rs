//! Error types for the contextbuddy orchestration core
//!
//! Only configuration and process-launch failures propagate as errors.
//! Every other failure kind (timeout, non-zero exit, parse failure) is
//! delivered as a normally-returned `RunResult`, so callers never need
//! exception handling to inspect a failed run.

use thiserror::Error;

/// Main error type for the tool orchestration core
///
/// Variants carry string payloads so the whole enum stays `Clone`; the
/// concurrency guard replays one shared outcome to every deduplicated caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Unknown or disabled tool id (rejected before any process is spawned)
    #[error("Unknown or disabled tool: {0}")]
    UnknownTool(String),

    /// The operating system could not create the process
    #[error("Failed to launch '{command}' for tool '{tool}': {message}")]
    Launch {
        tool: String,
        command: String,
        message: String,
    },

    /// Persistence errors (logged at the call site, never failing a run)
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_display() {
        let err = ToolError::UnknownTool("git.status".to_string());
        assert!(err.to_string().contains("git.status"));
    }

    #[test]
    fn test_launch_error_display() {
        let err = ToolError::Launch {
            tool: "lint".to_string(),
            command: "eslint".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("eslint"));
        assert!(err.to_string().contains("lint"));
    }

    #[test]
    fn test_errors_are_cloneable() {
        let err = ToolError::Storage("disk full".to_string());
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
