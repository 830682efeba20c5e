//! Cooperative cancellation for in-flight requests.
//!
//! The registry is the authority over request contexts; handlers hold a
//! [`CancelFlag`] and poll it at safe points. Cancellation is advisory:
//! nothing is ever preempted, the flag only asks the running computation to
//! stop at its next checkpoint. Cancelling an unknown or already-completed
//! request is a harmless no-op, since cancellation racing completion is
//! expected protocol behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use thiserror::Error;

/// Server-assigned identity of one dispatched request.
pub type RequestId = u64;

/// Outcome a handler returns when it observed a cancel request and stopped.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Request was cancelled")]
pub struct Cancelled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelState {
    Pending,
    CancelRequested,
    Completed,
}

const PENDING: u8 = 0;
const CANCEL_REQUESTED: u8 = 1;
const COMPLETED: u8 = 2;

/// Shared tri-state cell between the dispatcher and a running handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    state: Arc<AtomicU8>,
}

impl CancelFlag {
    pub fn state(&self) -> CancelState {
        match self.state.load(Ordering::Acquire) {
            CANCEL_REQUESTED => CancelState::CancelRequested,
            COMPLETED => CancelState::Completed,
            _ => CancelState::Pending,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCEL_REQUESTED
    }

    /// Bail out of the current computation if cancellation was requested.
    /// Handlers call this between stages of multi-step work.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    fn request_cancel(&self) {
        // Completion wins the race; a finished request cannot be cancelled.
        let _ = self.state.compare_exchange(
            PENDING,
            CANCEL_REQUESTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn complete(&self) {
        // Keeps an already-requested cancel visible to a worker that is
        // still polling the flag after its context was released.
        let _ = self.state.compare_exchange(
            PENDING,
            COMPLETED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// A live request context: the flag plus bookkeeping for logging.
#[derive(Debug)]
struct Context {
    flag: CancelFlag,
    started_at: Instant,
}

/// Table of in-flight request contexts, keyed by dispatch id.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    entries: DashMap<RequestId, Context>,
    next_id: AtomicU64,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context for a freshly dispatched request.
    pub fn register(&self) -> (RequestId, CancelFlag) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let flag = CancelFlag::default();
        self.entries.insert(
            id,
            Context {
                flag: flag.clone(),
                started_at: Instant::now(),
            },
        );
        (id, flag)
    }

    /// Request cancellation. Unknown or completed ids are no-ops.
    pub fn cancel(&self, id: RequestId) {
        if let Some(entry) = self.entries.get(&id) {
            entry.flag.request_cancel();
        }
    }

    /// Mark a request finished and release its context. Later cancels for
    /// the same id become no-ops.
    pub fn complete(&self, id: RequestId) {
        if let Some((_, ctx)) = self.entries.remove(&id) {
            ctx.flag.complete();
            tracing::trace!(
                request_id = id,
                elapsed_ms = ctx.started_at.elapsed().as_millis() as u64,
                "request context released"
            );
        }
    }

    /// Cancel everything still in flight; used on shutdown/exit.
    pub fn cancel_all(&self) {
        for entry in self.entries.iter() {
            entry.flag.request_cancel();
        }
    }

    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }
}
