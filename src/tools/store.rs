//! Result store
//!
//! Exclusively owns the id to `RunResult` map and its persisted form. A new
//! run overwrites the previous result for its tool; every put triggers a
//! detached persistence pass. Persistence failure is logged, never raised,
//! and the in-memory value stays authoritative for the session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::storage::StateStore;
use crate::tools::result::RunResult;

/// In-memory cache of the latest result per tool, with durable persistence
#[derive(Clone)]
pub struct ResultStore {
    results: Arc<Mutex<HashMap<String, RunResult>>>,
    storage: Arc<dyn StateStore>,
    key: String,
}

impl ResultStore {
    /// Create a store persisting under a workspace-scoped key
    pub fn new(storage: Arc<dyn StateStore>, workspace_slug: &str) -> Self {
        Self {
            results: Arc::new(Mutex::new(HashMap::new())),
            storage,
            key: format!("tool-results/{workspace_slug}"),
        }
    }

    /// The persisted key this store writes to
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Latest result for a tool, if any
    pub fn get(&self, id: &str) -> Option<RunResult> {
        self.results.lock().unwrap().get(id).cloned()
    }

    /// All cached results, unordered
    pub fn all(&self) -> Vec<RunResult> {
        self.results.lock().unwrap().values().cloned().collect()
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    /// Check if no results are cached
    pub fn is_empty(&self) -> bool {
        self.results.lock().unwrap().is_empty()
    }

    /// Record the latest result for a tool (overwrite) and persist in the
    /// background
    pub fn put(&self, result: RunResult) {
        self.results
            .lock()
            .unwrap()
            .insert(result.id.clone(), result);

        let store = self.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let _ = handle.spawn(async move { store.persist_all() });
        } else {
            store.persist_all();
        }
    }

    /// Rehydrate the cache from durable storage.
    ///
    /// Records that fail to decode are skipped with a warning; a missing or
    /// unreadable document leaves the cache empty.
    pub fn load_all(&self) {
        let document = match self.storage.load(&self.key) {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to load persisted tool results");
                return;
            }
        };

        let serde_json::Value::Object(entries) = document else {
            tracing::warn!(key = %self.key, "Persisted tool results have an unexpected shape");
            return;
        };

        let mut results = self.results.lock().unwrap();
        for (id, record) in entries {
            match serde_json::from_value::<RunResult>(record) {
                Ok(result) => {
                    results.insert(id, result);
                }
                Err(e) => {
                    tracing::warn!(tool = %id, error = %e, "Skipping unreadable persisted result");
                }
            }
        }
    }

    /// Write the whole map to durable storage; failure is logged, not raised
    pub fn persist_all(&self) {
        let snapshot = {
            let results = self.results.lock().unwrap();
            match serde_json::to_value(&*results) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to serialize tool results");
                    return;
                }
            }
        };

        if let Err(e) = self.storage.save(&self.key, &snapshot) {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist tool results");
        }
    }
}
