//! CLI tool orchestration
//!
//! Runs external command-line programs to gather fresh project signals:
//! - Descriptor registry (builtin + user declarations, disable directives)
//! - Execution engine (timeout, per-stream output caps, normalization)
//! - Concurrency guard (per-id dedup of non-forced runs)
//! - Result store (latest result per tool, durable persistence)
//! - Auto-run scheduler (staleness-driven refresh)
//! - Prompt composer (size-bounded context block)

pub mod builtins;
pub mod composer;
pub mod descriptor;
pub mod engine;
pub mod guard;
pub mod orchestrator;
pub mod registry;
pub mod result;
pub mod scheduler;
pub mod store;

// Re-export commonly used types
pub use builtins::{builtin_tools, WORKSPACE_SNAPSHOT_ID};
pub use descriptor::{OutputKind, Provenance, RunReason, RunRequest, ToolDescriptor};
pub use engine::{EngineLimits, ExecutionEngine};
pub use guard::ConcurrencyGuard;
pub use orchestrator::ToolOrchestrator;
pub use registry::ToolRegistry;
pub use result::RunResult;
pub use store::ResultStore;
