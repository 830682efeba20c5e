use thiserror::Error;
use tower_lsp::lsp_types::Url;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document is not open: {0}")]
    UnknownDocument(Url),

    #[error("Version mismatch on {uri} - ours: {current}, theirs: {proposed}")]
    VersionMismatch {
        uri: Url,
        current: i32,
        proposed: i32,
    },

    #[error("Document is already open: {0}")]
    AlreadyOpen(Url),
}
