use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;
use tracing::{error, warn};

use crate::analysis::{AnalysisEngine, AnalysisError};
use crate::cancel::CancelFlag;
use crate::store::DocumentStore;

/// Debounce-and-supersede re-analysis, one slot per document.
///
/// Every accepted mutation schedules a run; scheduling aborts whatever run
/// is still pending for that URI, so a burst of edits inside one quiet
/// window produces a single analysis of the final text. The task reads the
/// latest snapshot only after the window elapses and re-checks the version
/// before publishing, so a superseded run never publishes stale
/// diagnostics.
pub struct DiagnosticsScheduler {
    client: Client,
    store: Arc<DocumentStore>,
    engine: Arc<dyn AnalysisEngine>,
    pending: Arc<DashMap<Url, JoinHandle<()>>>,
    debounce: Duration,
}

impl DiagnosticsScheduler {
    pub fn new(
        client: Client,
        store: Arc<DocumentStore>,
        engine: Arc<dyn AnalysisEngine>,
        debounce: Duration,
    ) -> Self {
        Self {
            client,
            store,
            engine,
            pending: Arc::new(DashMap::new()),
            debounce,
        }
    }

    /// Schedule re-analysis for a document, superseding any pending run.
    pub fn schedule(&self, uri: Url) {
        if let Some((_, stale)) = self.pending.remove(&uri) {
            stale.abort();
        }

        let client = self.client.clone();
        let store = Arc::clone(&self.store);
        let engine = Arc::clone(&self.engine);
        let debounce = self.debounce;
        let task_uri = uri.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // Closed while we were waiting.
            let Ok(snapshot) = store.snapshot(&task_uri) else {
                return;
            };
            let version = snapshot.version();

            let flag = CancelFlag::default();
            let worker = {
                let engine = Arc::clone(&engine);
                let snapshot = snapshot.clone();
                tokio::task::spawn_blocking(move || engine.diagnostics(&snapshot, &flag))
            };

            match worker.await {
                Ok(Ok(diagnostics)) => {
                    // An edit that landed during analysis supersedes us.
                    let still_current = store
                        .snapshot(&task_uri)
                        .map(|s| s.version() == version)
                        .unwrap_or(false);
                    if still_current {
                        client
                            .publish_diagnostics(task_uri.clone(), diagnostics, Some(version))
                            .await;
                    }
                }
                Ok(Err(AnalysisError::Cancelled(_))) => {}
                Ok(Err(AnalysisError::Failed(message))) => {
                    warn!(uri = %task_uri, version, "re-analysis failed: {message}");
                }
                Err(join_error) => {
                    error!(uri = %task_uri, version, "re-analysis panicked: {join_error}");
                }
            }
        });

        // Finished handles stay in the map until superseded or cleared;
        // aborting one is a no-op.
        self.pending.insert(uri, handle);
    }

    /// Drop any pending run and clear the client's diagnostics for a
    /// document; used when it closes.
    pub async fn clear(&self, uri: Url) {
        if let Some((_, stale)) = self.pending.remove(&uri) {
            stale.abort();
        }
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    /// Abort every pending run; used at shutdown.
    pub fn abort_all(&self) {
        self.pending.retain(|_, handle| {
            handle.abort();
            false
        });
    }
}
