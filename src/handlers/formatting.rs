use tower_lsp::lsp_types::{DocumentFormattingParams, TextEdit};

use crate::analysis::{AnalysisEngine, AnalysisError};
use crate::cancel::CancelFlag;
use crate::store::Snapshot;

pub fn formatting(
    snapshot: &Snapshot,
    params: &DocumentFormattingParams,
    engine: &dyn AnalysisEngine,
    cancel: &CancelFlag,
) -> Result<Option<Vec<TextEdit>>, AnalysisError> {
    cancel.checkpoint()?;

    let edits = engine.formatting(snapshot, &params.options, cancel)?;

    cancel.checkpoint()?;
    Ok((!edits.is_empty()).then_some(edits))
}
