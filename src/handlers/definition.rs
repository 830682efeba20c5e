use tower_lsp::lsp_types::{GotoDefinitionParams, GotoDefinitionResponse};

use crate::analysis::{AnalysisEngine, AnalysisError};
use crate::cancel::CancelFlag;
use crate::store::Snapshot;

pub fn definition(
    snapshot: &Snapshot,
    params: &GotoDefinitionParams,
    engine: &dyn AnalysisEngine,
    cancel: &CancelFlag,
) -> Result<Option<GotoDefinitionResponse>, AnalysisError> {
    cancel.checkpoint()?;

    let position = params.text_document_position_params.position;
    let mut locations = engine.definition(snapshot, position, cancel)?;

    cancel.checkpoint()?;
    Ok(match locations.len() {
        0 => None,
        1 => Some(GotoDefinitionResponse::Scalar(locations.remove(0))),
        _ => Some(GotoDefinitionResponse::Array(locations)),
    })
}
