use std::sync::Arc;

use tokio::sync::Semaphore;
use tower_lsp::jsonrpc::{Error, ErrorCode};
use tower_lsp::lsp_types::Url;
use tracing::{error, warn};

use crate::analysis::{AnalysisEngine, AnalysisError};
use crate::cancel::{CancelFlag, CancelRegistry, RequestId};
use crate::config::Settings;
use crate::store::{DocumentStore, Snapshot, StoreError};

/// Runs request handlers against consistent snapshots.
///
/// For every request: register a context with the cancellation registry,
/// capture the target document's snapshot, execute the handler on the
/// bounded blocking pool, then complete the context and answer. The
/// snapshot is captured before the first await, so a request observes every
/// mutation fully applied before it was admitted.
///
/// Handler failures never escape: panics and engine errors are caught here,
/// logged with the document URI, version and request id, and turned into
/// protocol error responses.
pub struct Dispatcher {
    store: Arc<DocumentStore>,
    engine: Arc<dyn AnalysisEngine>,
    registry: Arc<CancelRegistry>,
    workers: Arc<Semaphore>,
    settings: Settings,
}

impl Dispatcher {
    pub fn new(
        store: Arc<DocumentStore>,
        engine: Arc<dyn AnalysisEngine>,
        registry: Arc<CancelRegistry>,
        settings: Settings,
    ) -> Self {
        // A zero-permit pool would never admit a request.
        let workers = settings.max_concurrent_requests.max(1);
        Self {
            store,
            engine,
            registry,
            workers: Arc::new(Semaphore::new(workers)),
            settings,
        }
    }

    pub async fn dispatch<T, F>(
        &self,
        method: &'static str,
        uri: &Url,
        handler: F,
    ) -> tower_lsp::jsonrpc::Result<T>
    where
        F: FnOnce(&Snapshot, &dyn AnalysisEngine, &CancelFlag) -> Result<T, AnalysisError>
            + Send
            + 'static,
        T: Send + 'static,
    {
        let snapshot = self.store.snapshot(uri).map_err(store_error_to_rpc)?;
        let version = snapshot.version();

        let (id, flag) = self.registry.register();
        // If the transport aborts this future on $/cancelRequest, the guard
        // flips the cooperative flag so the worker stops, and releases the
        // context. The registry never leaks an entry.
        let mut guard = ContextGuard {
            registry: Arc::clone(&self.registry),
            id,
            armed: true,
        };

        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| Error::internal_error())?;

        let engine = Arc::clone(&self.engine);
        let worker_flag = flag.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            handler(&snapshot, engine.as_ref(), &worker_flag)
        });

        let outcome = match tokio::time::timeout(self.settings.request_timeout, handle).await {
            Err(_) => {
                // The worker keeps its permit until it notices the flag, so
                // a hung handler cannot be re-admitted past the pool bound.
                warn!(method, %uri, version, request_id = id, "request timed out");
                self.registry.cancel(id);
                Err(Error {
                    code: ErrorCode::InternalError,
                    message: "Request timed out".into(),
                    data: None,
                })
            }
            Ok(Err(join_error)) => {
                error!(method, %uri, version, request_id = id, "handler panicked: {join_error}");
                Err(Error::internal_error())
            }
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(AnalysisError::Cancelled(_)))) => Err(Error::request_cancelled()),
            Ok(Ok(Err(AnalysisError::Failed(message)))) => {
                error!(method, %uri, version, request_id = id, "handler failed: {message}");
                Err(Error {
                    code: ErrorCode::InternalError,
                    message: message.into(),
                    data: None,
                })
            }
        };

        guard.armed = false;
        self.registry.complete(id);
        outcome
    }

    pub fn registry(&self) -> &Arc<CancelRegistry> {
        &self.registry
    }
}

fn store_error_to_rpc(err: StoreError) -> Error {
    Error::invalid_params(err.to_string())
}

struct ContextGuard {
    registry: Arc<CancelRegistry>,
    id: RequestId,
    armed: bool,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if self.armed {
            self.registry.cancel(self.id);
            self.registry.complete(self.id);
        }
    }
}
