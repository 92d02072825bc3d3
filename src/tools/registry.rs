//! Descriptor registry
//!
//! Holds the merged set of built-in and user-declared tool definitions with
//! resolved enable/disable state. The whole registry is rebuilt atomically on
//! every reload; readers never observe a partial merge. Token substitution is
//! applied at resolution time, so recorded run results reflect what was
//! actually asked for.

use std::collections::{HashMap, HashSet};

use crate::config::ToolConfigEntry;
use crate::errors::{Result, ToolError};
use crate::tools::descriptor::{Provenance, ToolDescriptor};
use crate::workspace::{substitute_tokens, WorkspaceContext};

/// Resolved tool registry
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// Map of tool id to resolved descriptor
    tools: HashMap<String, ToolDescriptor>,

    /// Ids removed by disable directives
    disabled: HashSet<String>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the registry from the builtin table and user declarations.
    ///
    /// Idempotent and total: identical input yields an identical resolved
    /// set. The new state replaces the old wholesale.
    pub fn reload(
        &mut self,
        builtins: &[ToolDescriptor],
        entries: &[ToolConfigEntry],
        workspace: &WorkspaceContext,
    ) {
        let mut tools = HashMap::new();
        let mut disabled = HashSet::new();

        for builtin in builtins {
            tools.insert(builtin.id.clone(), resolve_descriptor(builtin, workspace));
        }

        for entry in entries {
            if entry.is_disable_directive() {
                tools.remove(&entry.id);
                disabled.insert(entry.id.clone());
            } else {
                let descriptor = descriptor_from_entry(entry);
                disabled.remove(&entry.id);
                tools.insert(entry.id.clone(), resolve_descriptor(&descriptor, workspace));
            }
        }

        self.tools = tools;
        self.disabled = disabled;
    }

    /// Resolve a descriptor by id
    ///
    /// Unknown ids, disabled ids, and full declarations carrying
    /// `enabled: false` all reject the same way.
    pub fn resolve(&self, id: &str) -> Result<&ToolDescriptor> {
        match self.tools.get(id) {
            Some(descriptor) if descriptor.enabled => Ok(descriptor),
            _ => Err(ToolError::UnknownTool(id.to_string())),
        }
    }

    /// Enabled descriptors, sorted by title
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        let mut tools: Vec<&ToolDescriptor> =
            self.tools.values().filter(|d| d.enabled).collect();
        tools.sort_by(|a, b| a.title.cmp(&b.title));
        tools
    }

    /// Check whether an id resolves
    pub fn contains(&self, id: &str) -> bool {
        self.resolve(id).is_ok()
    }

    /// Whether an id was removed by a disable directive
    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled.contains(id)
    }

    /// Number of enabled descriptors
    pub fn len(&self) -> usize {
        self.list().len()
    }

    /// Check if no descriptors are enabled
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Apply token substitution to command, args, cwd, and env values
fn resolve_descriptor(descriptor: &ToolDescriptor, workspace: &WorkspaceContext) -> ToolDescriptor {
    let mut resolved = descriptor.clone();

    resolved.command = substitute_tokens(&descriptor.command, workspace);
    resolved.args = descriptor
        .args
        .iter()
        .map(|arg| substitute_tokens(arg, workspace))
        .collect();
    resolved.cwd = descriptor
        .cwd
        .as_deref()
        .map(|cwd| substitute_tokens(cwd, workspace));
    resolved.env = descriptor
        .env
        .iter()
        .map(|(k, v)| (k.clone(), substitute_tokens(v, workspace)))
        .collect();

    resolved
}

/// Construct a full descriptor from a user declaration, filling defaults
fn descriptor_from_entry(entry: &ToolConfigEntry) -> ToolDescriptor {
    let mut descriptor = ToolDescriptor::new(
        entry.id.clone(),
        entry.command.clone().unwrap_or_default(),
    );

    descriptor.title = entry.title.clone().unwrap_or_else(|| entry.id.clone());
    descriptor.description = entry.description.clone();
    descriptor.args = entry.args.clone();
    descriptor.cwd = entry.cwd.clone();
    descriptor.env = entry.env.clone();
    descriptor.shell = entry.shell.unwrap_or(false);
    descriptor.enabled = entry.enabled.unwrap_or(true);
    descriptor.auto_run = entry.auto_run.unwrap_or(false);
    if let Some(interval) = entry.refresh_interval_ms {
        descriptor.refresh_interval_ms = interval;
    }
    if let Some(timeout) = entry.timeout_ms {
        descriptor.timeout_ms = timeout;
    }
    if let Some(kind) = entry.output_type {
        descriptor.output_kind = kind;
    }
    descriptor.provenance = Provenance::User;

    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtins::{builtin_tools, WORKSPACE_SNAPSHOT_ID};
    use crate::tools::descriptor::OutputKind;
    use std::collections::HashMap as Map;

    fn workspace() -> WorkspaceContext {
        WorkspaceContext::new("/opt/host", "/usr/bin/node")
            .with_workspace_root("/proj")
            .with_ambient_env(Map::new())
    }

    fn reloaded(entries: &[ToolConfigEntry]) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.reload(&builtin_tools(), entries, &workspace());
        registry
    }

    #[test]
    fn test_builtins_present_by_default() {
        let registry = reloaded(&[]);
        assert!(registry.contains(WORKSPACE_SNAPSHOT_ID));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_builtin_tokens_resolved_at_reload() {
        let registry = reloaded(&[]);
        let snapshot = registry.resolve(WORKSPACE_SNAPSHOT_ID).unwrap();

        assert_eq!(snapshot.command, "/usr/bin/node");
        assert_eq!(snapshot.args[0], "/opt/host/scripts/workspace-snapshot.js");
    }

    #[test]
    fn test_disable_directive_removes_builtin() {
        let registry = reloaded(&[ToolConfigEntry::disable(WORKSPACE_SNAPSHOT_ID)]);

        assert!(!registry.contains(WORKSPACE_SNAPSHOT_ID));
        assert!(registry.is_disabled(WORKSPACE_SNAPSHOT_ID));
        assert!(registry.resolve(WORKSPACE_SNAPSHOT_ID).is_err());
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_user_entry_overrides_builtin() {
        let mut entry = ToolConfigEntry::new(WORKSPACE_SNAPSHOT_ID, "git");
        entry.args = vec!["status".to_string()];

        let registry = reloaded(&[entry]);
        let snapshot = registry.resolve(WORKSPACE_SNAPSHOT_ID).unwrap();

        assert_eq!(snapshot.command, "git");
        assert_eq!(snapshot.provenance, Provenance::User);
    }

    #[test]
    fn test_user_entry_defaults() {
        let registry = reloaded(&[ToolConfigEntry::new("lint", "eslint")]);
        let lint = registry.resolve("lint").unwrap();

        assert_eq!(lint.title, "lint");
        assert_eq!(lint.output_kind, OutputKind::Raw);
        assert!(lint.enabled);
        assert!(!lint.auto_run);
        assert!(!lint.shell);
    }

    #[test]
    fn test_user_entry_tokens_resolved() {
        let mut entry = ToolConfigEntry::new("interp", "${node}");
        entry.cwd = Some("${workspaceRoot}".to_string());
        entry.env = Map::from([("ROOT".to_string(), "${workspaceRoot}/x".to_string())]);
        entry.args = vec!["${nope}".to_string()];

        let registry = reloaded(&[entry]);
        let interp = registry.resolve("interp").unwrap();

        assert_eq!(interp.command, "/usr/bin/node");
        assert_eq!(interp.cwd.as_deref(), Some("/proj"));
        assert_eq!(interp.env.get("ROOT").map(String::as_str), Some("/proj/x"));
        // Unknown tokens pass through unchanged.
        assert_eq!(interp.args[0], "${nope}");
    }

    #[test]
    fn test_declared_disabled_tool_rejected_but_listed_nowhere() {
        let mut entry = ToolConfigEntry::new("off", "true");
        entry.enabled = Some(false);

        let registry = reloaded(&[entry]);
        assert!(registry.resolve("off").is_err());
        assert!(registry.list().iter().all(|d| d.id != "off"));
    }

    #[test]
    fn test_list_sorted_by_title() {
        let mut zz = ToolConfigEntry::new("a.id", "true");
        zz.title = Some("Zeta".to_string());
        let mut aa = ToolConfigEntry::new("z.id", "true");
        aa.title = Some("Alpha".to_string());

        let registry = reloaded(&[zz, aa, ToolConfigEntry::disable(WORKSPACE_SNAPSHOT_ID)]);
        let titles: Vec<&str> = registry.list().iter().map(|d| d.title.as_str()).collect();

        assert_eq!(titles, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_reload_is_idempotent() {
        let entries = vec![ToolConfigEntry::new("lint", "eslint")];
        let mut registry = ToolRegistry::new();

        registry.reload(&builtin_tools(), &entries, &workspace());
        let first: Vec<ToolDescriptor> = registry.list().into_iter().cloned().collect();

        registry.reload(&builtin_tools(), &entries, &workspace());
        let second: Vec<ToolDescriptor> = registry.list().into_iter().cloned().collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_reload_replaces_previous_state() {
        let mut registry = ToolRegistry::new();
        registry.reload(
            &builtin_tools(),
            &[ToolConfigEntry::new("lint", "eslint")],
            &workspace(),
        );
        assert!(registry.contains("lint"));

        registry.reload(&builtin_tools(), &[], &workspace());
        assert!(!registry.contains("lint"));
        assert!(registry.contains(WORKSPACE_SNAPSHOT_ID));
    }

    #[test]
    fn test_full_declaration_clears_earlier_disable() {
        let registry = reloaded(&[
            ToolConfigEntry::disable("lint"),
            ToolConfigEntry::new("lint", "eslint"),
        ]);

        assert!(registry.contains("lint"));
        assert!(!registry.is_disabled("lint"));
    }
}
