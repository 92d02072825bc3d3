//! Tool orchestrator
//!
//! Facade wiring the descriptor registry, concurrency guard, execution
//! engine, result store, auto-run scheduler, and prompt composer. This is
//! the API surface collaborators consume: list tools, run a tool by id,
//! fetch the last result, ensure auto-run freshness, compose context.

use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::ToolConfigEntry;
use crate::errors::Result;
use crate::storage::StateStore;
use crate::telemetry::{RunEvent, TelemetryCollector};
use crate::tools::builtins::builtin_tools;
use crate::tools::composer;
use crate::tools::descriptor::{RunRequest, ToolDescriptor};
use crate::tools::engine::{EngineLimits, ExecutionEngine};
use crate::tools::guard::ConcurrencyGuard;
use crate::tools::registry::ToolRegistry;
use crate::tools::result::RunResult;
use crate::tools::scheduler;
use crate::tools::store::ResultStore;
use crate::workspace::WorkspaceContext;

/// Orchestration core for CLI tool execution
pub struct ToolOrchestrator {
    registry: Mutex<ToolRegistry>,
    engine: Arc<ExecutionEngine>,
    guard: ConcurrencyGuard,
    store: ResultStore,
    telemetry: TelemetryCollector,
    workspace: WorkspaceContext,
}

impl ToolOrchestrator {
    /// Create an orchestrator and rehydrate cached results from storage
    pub fn new(workspace: WorkspaceContext, storage: Arc<dyn StateStore>) -> Self {
        Self::with_limits(workspace, storage, EngineLimits::default())
    }

    /// Create an orchestrator with custom capture caps
    pub fn with_limits(
        workspace: WorkspaceContext,
        storage: Arc<dyn StateStore>,
        limits: EngineLimits,
    ) -> Self {
        let telemetry = TelemetryCollector::new();
        let engine = ExecutionEngine::new(workspace.clone())
            .with_limits(limits)
            .with_telemetry(telemetry.clone());

        let store = ResultStore::new(storage, &workspace.workspace_slug());
        store.load_all();

        let mut registry = ToolRegistry::new();
        registry.reload(&builtin_tools(), &[], &workspace);

        Self {
            registry: Mutex::new(registry),
            engine: Arc::new(engine),
            guard: ConcurrencyGuard::new(),
            store,
            telemetry,
            workspace,
        }
    }

    /// Rebuild the registry atomically from builtins plus user declarations.
    ///
    /// The collaborator that detects configuration changes decides when to
    /// call this; the core never polls or subscribes.
    pub fn reload_config(&self, entries: &[ToolConfigEntry]) {
        let mut fresh = ToolRegistry::new();
        fresh.reload(&builtin_tools(), entries, &self.workspace);

        *self.registry.lock().unwrap() = fresh;
    }

    /// Resolved descriptors, sorted by title
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.registry
            .lock()
            .unwrap()
            .list()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Latest cached result for a tool, if any
    pub fn last_result(&self, id: &str) -> Option<RunResult> {
        self.store.get(id)
    }

    /// Run a tool by id.
    ///
    /// Non-forced requests deduplicate against an in-flight run for the same
    /// id; forced requests always spawn a fresh process. Rejects only for
    /// unknown/disabled ids and launch failures.
    pub async fn run_tool(&self, id: &str, request: RunRequest) -> Result<RunResult> {
        let descriptor = self.registry.lock().unwrap().resolve(id)?.clone();

        if !request.force && self.guard.is_pending(id) {
            self.telemetry.record(RunEvent::RunDeduped {
                tool: id.to_string(),
                timestamp: Instant::now(),
            });
        }

        let engine = Arc::clone(&self.engine);
        let store = self.store.clone();

        let execute = async move {
            let result = engine.execute(&descriptor, request).await?;
            store.put(result.clone());
            Ok(result)
        };

        self.guard.run_deduped(id, request.force, execute).await
    }

    /// Refresh every enabled auto-run tool whose cached result is stale.
    ///
    /// A failure for one tool is logged and does not block the rest. Awaits
    /// completion of all needed refresh runs.
    pub async fn ensure_fresh(&self) {
        let descriptors = self.list_tools();
        let due = scheduler::stale_ids(&descriptors, &self.store, Utc::now());

        for id in due {
            let request = RunRequest::auto().forced();
            if let Err(e) = self.run_tool(&id, request).await {
                tracing::warn!(tool = %id, error = %e, "Auto-run refresh failed");
            }
        }
    }

    /// Compose cached results into a size-bounded context block
    pub fn compose(&self, max_chars: usize) -> Option<String> {
        composer::compose(self.store.all(), max_chars)
    }

    /// Flush the result cache to durable storage now
    pub fn persist_now(&self) {
        self.store.persist_all();
    }

    /// Access the run telemetry collector
    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Access the result store (read paths for display surfaces)
    pub fn store(&self) -> &ResultStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolError;
    use crate::storage::MemoryStore;
    use crate::tools::builtins::WORKSPACE_SNAPSHOT_ID;
    use tempfile::TempDir;

    fn orchestrator_in(root: &std::path::Path) -> ToolOrchestrator {
        let workspace = WorkspaceContext::new("/opt/host", "node").with_workspace_root(root);
        ToolOrchestrator::new(workspace, Arc::new(MemoryStore::new()))
    }

    fn echo_entry(id: &str, text: &str) -> ToolConfigEntry {
        let mut entry = ToolConfigEntry::new(id, "echo");
        entry.args = vec![text.to_string()];
        entry
    }

    #[tokio::test]
    async fn test_run_returns_matching_id() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator_in(temp.path());
        orchestrator.reload_config(&[echo_entry("greet", "hello")]);

        let result = orchestrator
            .run_tool("greet", RunRequest::manual())
            .await
            .unwrap();

        assert_eq!(result.id, "greet");
        assert_eq!(result.stdout, "hello");
    }

    #[tokio::test]
    async fn test_unknown_id_rejected_before_spawn() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator_in(temp.path());

        let err = orchestrator.run_tool("ghost", RunRequest::manual()).await;
        assert!(matches!(err, Err(ToolError::UnknownTool(_))));
        assert!(orchestrator.last_result("ghost").is_none());
    }

    #[tokio::test]
    async fn test_disabled_builtin_rejected() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator_in(temp.path());
        orchestrator.reload_config(&[ToolConfigEntry::disable(WORKSPACE_SNAPSHOT_ID)]);

        assert!(orchestrator
            .list_tools()
            .iter()
            .all(|d| d.id != WORKSPACE_SNAPSHOT_ID));
        let err = orchestrator
            .run_tool(WORKSPACE_SNAPSHOT_ID, RunRequest::manual())
            .await;
        assert!(matches!(err, Err(ToolError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn test_result_cached_after_run() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator_in(temp.path());
        orchestrator.reload_config(&[echo_entry("greet", "hello")]);

        orchestrator
            .run_tool("greet", RunRequest::manual())
            .await
            .unwrap();

        let cached = orchestrator.last_result("greet").unwrap();
        assert_eq!(cached.stdout, "hello");
    }

    #[tokio::test]
    async fn test_reload_swaps_registry_atomically() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator_in(temp.path());

        orchestrator.reload_config(&[echo_entry("one", "1")]);
        assert!(orchestrator.list_tools().iter().any(|d| d.id == "one"));

        orchestrator.reload_config(&[echo_entry("two", "2")]);
        let ids: Vec<String> = orchestrator.list_tools().iter().map(|d| d.id.clone()).collect();
        assert!(!ids.contains(&"one".to_string()));
        assert!(ids.contains(&"two".to_string()));
    }

    #[tokio::test]
    async fn test_compose_reads_store() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator_in(temp.path());
        orchestrator.reload_config(&[echo_entry("greet", "hello")]);

        assert!(orchestrator.compose(10_000).is_none());

        orchestrator
            .run_tool("greet", RunRequest::manual())
            .await
            .unwrap();

        let text = orchestrator.compose(10_000).unwrap();
        assert!(text.contains("hello"));
    }
}
