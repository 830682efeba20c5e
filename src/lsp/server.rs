use tower_lsp::{LspService, Server};
use tracing::info;

use crate::config::Settings;
use crate::log::init;
use crate::lsp::backend::Backend;

pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    init()?;

    info!("Starting bridge-lsp server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    // $/cancelRequest is intercepted by tower-lsp, which aborts the matching
    // in-flight handler future; the dispatcher turns that abort into a
    // cooperative cancel of the running worker.
    let (service, socket) = LspService::build(move |client| {
        Backend::build(
            client,
            std::sync::Arc::new(crate::analysis::WordEngine::new()),
            settings.clone(),
        )
    })
    .finish();
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("bridge-lsp server stopped");
    Ok(())
}
