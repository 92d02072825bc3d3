//! Tool descriptor types
//!
//! Plain serde records describing runnable tools: invocation spec, policy,
//! and provenance. Descriptors are immutable once resolved by the registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default refresh interval for auto-run tools (5 minutes)
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 300_000;

/// Default execution timeout (30 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// How a tool's stdout is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Captured text is kept verbatim
    #[default]
    Raw,
    /// Stdout is decoded as JSON into a structured payload
    Structured,
}

/// Where a descriptor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Builtin,
    #[default]
    User,
}

/// Static definition of a runnable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique id within the resolved registry
    pub id: String,

    /// Display title (defaults to the id)
    pub title: String,

    /// Optional human-readable description
    pub description: Option<String>,

    /// Command to execute (post token substitution)
    pub command: String,

    /// Ordered argument list
    pub args: Vec<String>,

    /// Optional working-directory override
    pub cwd: Option<String>,

    /// Environment-variable overrides (win over the ambient environment)
    pub env: HashMap<String, String>,

    /// Run the command line through the platform shell
    pub shell: bool,

    /// Whether the tool may be resolved and run
    pub enabled: bool,

    /// Refresh automatically before assessments
    pub auto_run: bool,

    /// Staleness horizon for auto-run results
    pub refresh_interval_ms: u64,

    /// Execution timeout; 0 disables the timer
    pub timeout_ms: u64,

    /// Output interpretation tag
    pub output_kind: OutputKind,

    /// Builtin or user-declared
    pub provenance: Provenance,
}

impl ToolDescriptor {
    /// Create a descriptor with policy defaults
    pub fn new(id: impl Into<String>, command: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            description: None,
            command: command.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            shell: false,
            enabled: true,
            auto_run: false,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            output_kind: OutputKind::Raw,
            provenance: Provenance::User,
        }
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the argument list
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set the working-directory override
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set environment overrides
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Enable shell interpretation
    pub fn with_shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    /// Flag for automatic refresh
    pub fn with_auto_run(mut self, auto_run: bool) -> Self {
        self.auto_run = auto_run;
        self
    }

    /// Set the refresh interval
    pub fn with_refresh_interval_ms(mut self, ms: u64) -> Self {
        self.refresh_interval_ms = ms;
        self
    }

    /// Set the execution timeout
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set the output interpretation
    pub fn with_output_kind(mut self, kind: OutputKind) -> Self {
        self.output_kind = kind;
        self
    }

    /// Set the provenance tag
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Execution timeout as a duration; `None` disables the timer
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }

    /// Staleness horizon as a duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

/// Why a run was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunReason {
    #[default]
    Manual,
    Auto,
}

/// Per-call execution request
///
/// `force` bypasses the concurrency guard and any staleness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunRequest {
    pub reason: RunReason,
    pub force: bool,
}

impl RunRequest {
    /// A non-forced manual request
    pub fn manual() -> Self {
        Self {
            reason: RunReason::Manual,
            force: false,
        }
    }

    /// A non-forced automatic request
    pub fn auto() -> Self {
        Self {
            reason: RunReason::Auto,
            force: false,
        }
    }

    /// Mark the request as forced
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}
