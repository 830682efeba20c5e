use tower_lsp::lsp_types::{CompletionParams, CompletionResponse};

use crate::analysis::{AnalysisEngine, AnalysisError};
use crate::cancel::CancelFlag;
use crate::store::Snapshot;

pub fn completion(
    snapshot: &Snapshot,
    params: &CompletionParams,
    engine: &dyn AnalysisEngine,
    cancel: &CancelFlag,
) -> Result<Option<CompletionResponse>, AnalysisError> {
    cancel.checkpoint()?;

    let position = params.text_document_position.position;
    let items = engine.completions(snapshot, position, cancel)?;

    cancel.checkpoint()?;
    Ok((!items.is_empty()).then_some(CompletionResponse::Array(items)))
}
