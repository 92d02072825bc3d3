//! Concurrency guard
//!
//! Deduplicates non-forced concurrent execution requests per tool id.
//! Callers that arrive while a run is outstanding attach to the same shared
//! outcome and observe the identical eventual result. Forced requests always
//! start a fresh process and never consult the map.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::errors::Result;
use crate::tools::result::RunResult;

type SharedRun = Shared<BoxFuture<'static, Result<RunResult>>>;

/// Per-id deduplication of in-flight, non-forced executions
#[derive(Clone, Default)]
pub struct ConcurrencyGuard {
    pending: Arc<Mutex<HashMap<String, SharedRun>>>,
}

impl ConcurrencyGuard {
    /// Create an empty guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a non-forced run for `id` is currently outstanding
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.lock().unwrap().contains_key(id)
    }

    /// Number of runs currently in flight
    pub fn in_flight(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Run `execute` deduplicated by `id`.
    ///
    /// Non-forced: attach to an outstanding run for the same id if one
    /// exists, otherwise start one and publish it. The entry is removed the
    /// moment the outcome settles, so a later request starts a new execution
    /// instead of reusing a stale shared outcome. Forced: run immediately,
    /// untracked.
    pub async fn run_deduped<F>(&self, id: &str, force: bool, execute: F) -> Result<RunResult>
    where
        F: Future<Output = Result<RunResult>> + Send + 'static,
    {
        if force {
            return execute.await;
        }

        let shared = {
            let mut pending = self.pending.lock().unwrap();

            if let Some(existing) = pending.get(id) {
                existing.clone()
            } else {
                let map = Arc::clone(&self.pending);
                let key = id.to_string();

                let run: SharedRun = async move {
                    let outcome = execute.await;
                    map.lock().unwrap().remove(&key);
                    outcome
                }
                .boxed()
                .shared();

                pending.insert(id.to_string(), run.clone());
                run
            }
        };

        shared.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn result_for(id: &str) -> RunResult {
        RunResult {
            id: id.to_string(),
            started_at: chrono::Utc::now(),
            success: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_execution() {
        let guard = ConcurrencyGuard::new();
        let executions = Arc::new(AtomicUsize::new(0));

        let run = |guard: ConcurrencyGuard, counter: Arc<AtomicUsize>| async move {
            guard
                .run_deduped("x", false, async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(result_for("x"))
                })
                .await
        };

        let (a, b) = tokio::join!(
            run(guard.clone(), executions.clone()),
            run(guard.clone(), executions.clone())
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(executions.load(Ordering::SeqCst), 1);
        assert_eq!(a.started_at, b.started_at);
    }

    #[tokio::test]
    async fn test_forced_request_never_deduplicated() {
        let guard = ConcurrencyGuard::new();
        let executions = Arc::new(AtomicUsize::new(0));

        let slow = {
            let guard = guard.clone();
            let counter = executions.clone();
            async move {
                guard
                    .run_deduped("x", false, async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(result_for("x"))
                    })
                    .await
            }
        };
        let handle = tokio::spawn(slow);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(guard.is_pending("x"));

        let counter = executions.clone();
        let forced = guard
            .run_deduped("x", true, async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(result_for("x"))
            })
            .await
            .unwrap();

        let shared = handle.await.unwrap().unwrap();
        assert_eq!(executions.load(Ordering::SeqCst), 2);
        assert!(forced.success && shared.success);
    }

    #[tokio::test]
    async fn test_entry_removed_after_settle() {
        let guard = ConcurrencyGuard::new();

        guard
            .run_deduped("x", false, async { Ok(result_for("x")) })
            .await
            .unwrap();
        assert!(!guard.is_pending("x"));
        assert_eq!(guard.in_flight(), 0);

        // A later request starts a new execution rather than reusing the
        // settled outcome.
        let second = guard
            .run_deduped("x", false, async { Ok(result_for("x")) })
            .await
            .unwrap();
        assert!(second.success);
    }

    #[tokio::test]
    async fn test_different_ids_run_independently() {
        let guard = ConcurrencyGuard::new();
        let executions = Arc::new(AtomicUsize::new(0));

        let run = |guard: ConcurrencyGuard, counter: Arc<AtomicUsize>, id: &'static str| async move {
            guard
                .run_deduped(id, false, async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(result_for(id))
                })
                .await
        };

        let (a, b) = tokio::join!(
            run(guard.clone(), executions.clone(), "x"),
            run(guard.clone(), executions.clone(), "y")
        );

        assert_eq!(executions.load(Ordering::SeqCst), 2);
        assert_eq!(a.unwrap().id, "x");
        assert_eq!(b.unwrap().id, "y");
    }

    #[tokio::test]
    async fn test_error_outcome_shared_and_cleared() {
        let guard = ConcurrencyGuard::new();

        let err = guard
            .run_deduped("x", false, async {
                Err(crate::errors::ToolError::Launch {
                    tool: "x".to_string(),
                    command: "ghost".to_string(),
                    message: "not found".to_string(),
                })
            })
            .await;

        assert!(err.is_err());
        assert!(!guard.is_pending("x"));
    }
}
