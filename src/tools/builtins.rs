//! Built-in tool table
//!
//! Ships one default tool: a workspace snapshot gathering version-control
//! status, recent history summaries, and manifest metadata. It runs through
//! the identical path as any user-declared tool; the engine has no special
//! case for it. A user declaration with the same id and `enabled: false`
//! soft-disables it.

use crate::tools::descriptor::{OutputKind, Provenance, ToolDescriptor};

/// Id of the shipped workspace snapshot tool
pub const WORKSPACE_SNAPSHOT_ID: &str = "builtin.workspaceSnapshot";

/// The fixed builtin table
pub fn builtin_tools() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor::new(WORKSPACE_SNAPSHOT_ID, "${node}")
        .with_title("Workspace snapshot")
        .with_description(
            "Version-control status, recent history, and manifest metadata for the active workspace",
        )
        .with_args(vec![
            "${extensionRoot}/scripts/workspace-snapshot.js".to_string(),
        ])
        .with_output_kind(OutputKind::Structured)
        .with_auto_run(true)
        .with_provenance(Provenance::Builtin)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_contents() {
        let builtins = builtin_tools();
        assert_eq!(builtins.len(), 1);

        let snapshot = &builtins[0];
        assert_eq!(snapshot.id, WORKSPACE_SNAPSHOT_ID);
        assert_eq!(snapshot.provenance, Provenance::Builtin);
        assert_eq!(snapshot.output_kind, OutputKind::Structured);
        assert!(snapshot.auto_run);
        assert!(snapshot.enabled);
    }

    #[test]
    fn test_builtin_uses_interpreter_token() {
        let snapshot = &builtin_tools()[0];
        assert_eq!(snapshot.command, "${node}");
        assert!(snapshot.args[0].starts_with("${extensionRoot}"));
    }
}
