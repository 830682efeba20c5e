use tower_lsp::lsp_types::{Hover, HoverParams};

use crate::analysis::{AnalysisEngine, AnalysisError};
use crate::cancel::CancelFlag;
use crate::store::Snapshot;

pub fn hover(
    snapshot: &Snapshot,
    params: &HoverParams,
    engine: &dyn AnalysisEngine,
    cancel: &CancelFlag,
) -> Result<Option<Hover>, AnalysisError> {
    cancel.checkpoint()?;

    let position = params.text_document_position_params.position;
    let result = engine.hover(snapshot, position, cancel)?;

    cancel.checkpoint()?;
    Ok(result)
}
