use tower_lsp::lsp_types::{RenameParams, WorkspaceEdit};

use crate::analysis::{AnalysisEngine, AnalysisError};
use crate::cancel::CancelFlag;
use crate::store::Snapshot;

pub fn rename(
    snapshot: &Snapshot,
    params: &RenameParams,
    engine: &dyn AnalysisEngine,
    cancel: &CancelFlag,
) -> Result<Option<WorkspaceEdit>, AnalysisError> {
    cancel.checkpoint()?;

    let position = params.text_document_position.position;
    let edit = engine.rename(snapshot, position, &params.new_name, cancel)?;

    cancel.checkpoint()?;
    Ok(edit)
}
