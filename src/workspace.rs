//! Workspace context and token substitution
//!
//! Ambient host state (workspace root, install root, interpreter path, the
//! process environment) is passed into the engine as explicit inputs rather
//! than read from mutable globals, so the core stays testable without a
//! live host.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Explicit ambient inputs for descriptor resolution and process launch
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    /// Active project root, if one is open
    pub workspace_root: Option<PathBuf>,

    /// Install root of the hosting system (scripted builtins live under it)
    pub extension_root: PathBuf,

    /// Path to the runtime interpreter used for built-in scripted tools
    pub node_path: PathBuf,

    /// Ambient process environment, captured at construction
    pub ambient_env: HashMap<String, String>,
}

impl WorkspaceContext {
    /// Create a context with the ambient environment of the current process
    pub fn new(extension_root: impl Into<PathBuf>, node_path: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: None,
            extension_root: extension_root.into(),
            node_path: node_path.into(),
            ambient_env: std::env::vars().collect(),
        }
    }

    /// Build a context from the current host process
    pub fn from_host() -> Self {
        let extension_root = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        let mut ctx = Self::new(extension_root, "node");
        ctx.workspace_root = std::env::current_dir().ok();
        ctx
    }

    /// Set the workspace root
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Replace the ambient environment (hermetic tests)
    pub fn with_ambient_env(mut self, env: HashMap<String, String>) -> Self {
        self.ambient_env = env;
        self
    }

    /// Directory that `${workspaceRoot}` resolves against: the active
    /// project root, else the process working directory
    pub fn effective_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Filesystem-safe identifier for the workspace, used to scope the
    /// persisted result key
    pub fn workspace_slug(&self) -> String {
        let root = self.effective_root();
        let slug: String = root
            .to_string_lossy()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | ' ' => '-',
                other => other,
            })
            .collect();

        slug.trim_matches('-').to_string()
    }
}

/// Resolve placeholder variables in a descriptor string.
///
/// Recognized tokens: `${workspaceRoot}` / `${workspaceFolder}` (active
/// project root, else process cwd), `${extensionRoot}`, `${node}`. Unknown
/// tokens pass through unchanged.
pub fn substitute_tokens(input: &str, ctx: &WorkspaceContext) -> String {
    let root = ctx.effective_root();

    input
        .replace("${workspaceRoot}", &root.to_string_lossy())
        .replace("${workspaceFolder}", &root.to_string_lossy())
        .replace("${extensionRoot}", &ctx.extension_root.to_string_lossy())
        .replace("${node}", &ctx.node_path.to_string_lossy())
}
