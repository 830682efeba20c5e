//! Analysis engine boundary
//! - word.rs: built-in identifier-based engine
//!
//! The server core never computes semantics itself; it hands an immutable
//! snapshot and a cancel flag to an [`AnalysisEngine`] and relays the
//! results. Engines must be safe for concurrent reads against different
//! snapshots and are expected to honor the flag between long-running stages.

pub mod word;

pub use word::WordEngine;

use thiserror::Error;
use tower_lsp::lsp_types::{
    CompletionItem, Diagnostic, FormattingOptions, Hover, Location, Position, TextEdit,
    WorkspaceEdit,
};

use crate::cancel::{CancelFlag, Cancelled};
use crate::store::Snapshot;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("Analysis failed: {0}")]
    Failed(String),
}

/// Read-only query API over one document snapshot.
#[cfg_attr(test, mockall::automock)]
pub trait AnalysisEngine: Send + Sync {
    fn diagnostics(
        &self,
        snapshot: &Snapshot,
        cancel: &CancelFlag,
    ) -> Result<Vec<Diagnostic>, AnalysisError>;

    fn completions(
        &self,
        snapshot: &Snapshot,
        position: Position,
        cancel: &CancelFlag,
    ) -> Result<Vec<CompletionItem>, AnalysisError>;

    fn hover(
        &self,
        snapshot: &Snapshot,
        position: Position,
        cancel: &CancelFlag,
    ) -> Result<Option<Hover>, AnalysisError>;

    fn definition(
        &self,
        snapshot: &Snapshot,
        position: Position,
        cancel: &CancelFlag,
    ) -> Result<Vec<Location>, AnalysisError>;

    fn rename(
        &self,
        snapshot: &Snapshot,
        position: Position,
        new_name: &str,
        cancel: &CancelFlag,
    ) -> Result<Option<WorkspaceEdit>, AnalysisError>;

    fn formatting(
        &self,
        snapshot: &Snapshot,
        options: &FormattingOptions,
        cancel: &CancelFlag,
    ) -> Result<Vec<TextEdit>, AnalysisError>;
}
