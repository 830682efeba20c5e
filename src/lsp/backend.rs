use std::sync::Arc;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{info, warn};

use crate::analysis::{AnalysisEngine, WordEngine};
use crate::cancel::CancelRegistry;
use crate::config::Settings;
use crate::handlers;
use crate::lsp::diagnostics::DiagnosticsScheduler;
use crate::lsp::dispatcher::Dispatcher;
use crate::store::{DocumentStore, StoreError};

pub struct Backend {
    client: Client,
    store: Arc<DocumentStore>,
    registry: Arc<CancelRegistry>,
    dispatcher: Dispatcher,
    diagnostics: DiagnosticsScheduler,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self::build(client, Arc::new(WordEngine::new()), Settings::default())
    }

    /// Wire the backend to a specific engine and settings; tests inject
    /// scripted engines and short debounce windows here.
    pub fn build(client: Client, engine: Arc<dyn AnalysisEngine>, settings: Settings) -> Self {
        let store = Arc::new(DocumentStore::new());
        let registry = Arc::new(CancelRegistry::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::clone(&engine),
            Arc::clone(&registry),
            settings.clone(),
        );
        let diagnostics = DiagnosticsScheduler::new(
            client.clone(),
            Arc::clone(&store),
            engine,
            settings.debounce,
        );

        Self {
            client,
            store,
            registry,
            dispatcher,
            diagnostics,
        }
    }

    pub fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::INCREMENTAL),
                    save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                    ..Default::default()
                },
            )),
            completion_provider: Some(CompletionOptions::default()),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            definition_provider: Some(OneOf::Left(true)),
            rename_provider: Some(OneOf::Left(true)),
            document_formatting_provider: Some(OneOf::Left(true)),
            ..Default::default()
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _params: InitializeParams) -> Result<InitializeResult> {
        self.client
            .log_message(MessageType::INFO, "LSP server initializing")
            .await;
        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "bridge-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!(
            in_flight = self.registry.in_flight(),
            open_documents = self.store.open_count(),
            "LSP server shutting down"
        );
        self.registry.cancel_all();
        self.diagnostics.abort_all();
        self.client
            .log_message(MessageType::INFO, "LSP server shutting down")
            .await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;

        // Store mutation happens before the first await so open/change/close
        // for one document land in arrival order.
        match self.store.open(&doc.uri, &doc.text, &doc.language_id, doc.version) {
            Ok(()) => {}
            Err(StoreError::AlreadyOpen(_)) => {
                // Clients should not double-open; reset to their copy.
                warn!(uri = %doc.uri, "URI was opened again without being closed, resetting");
                self.store.close(&doc.uri);
                let _ = self.store.open(&doc.uri, &doc.text, &doc.language_id, doc.version);
            }
            Err(err) => {
                warn!(uri = %doc.uri, "didOpen dropped: {err}");
                return;
            }
        }

        self.diagnostics.schedule(doc.uri.clone());
        self.client
            .log_message(MessageType::LOG, format!("Document opened: {}", doc.uri))
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        match self
            .store
            .apply_changes(&uri, version, &params.content_changes)
        {
            Ok(_) => self.diagnostics.schedule(uri),
            // No response channel for notifications: log and drop.
            Err(err) => warn!(%uri, version, "didChange dropped: {err}"),
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        if self.store.is_open(&uri) {
            self.diagnostics.schedule(uri);
        } else {
            warn!(%uri, "didSave for a document that isn't being managed");
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        if !self.store.close(&uri) {
            warn!(%uri, "attempted to close document without opening it");
        }
        self.diagnostics.clear(uri.clone()).await;
        self.client
            .log_message(MessageType::LOG, format!("Document closed: {}", uri))
            .await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri.clone();
        self.dispatcher
            .dispatch("textDocument/completion", &uri, move |snapshot, engine, flag| {
                handlers::completion(snapshot, &params, engine, flag)
            })
            .await
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params
            .text_document_position_params
            .text_document
            .uri
            .clone();
        self.dispatcher
            .dispatch("textDocument/hover", &uri, move |snapshot, engine, flag| {
                handlers::hover(snapshot, &params, engine, flag)
            })
            .await
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params
            .text_document_position_params
            .text_document
            .uri
            .clone();
        self.dispatcher
            .dispatch("textDocument/definition", &uri, move |snapshot, engine, flag| {
                handlers::definition(snapshot, &params, engine, flag)
            })
            .await
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri.clone();
        self.dispatcher
            .dispatch("textDocument/rename", &uri, move |snapshot, engine, flag| {
                handlers::rename(snapshot, &params, engine, flag)
            })
            .await
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let uri = params.text_document.uri.clone();
        self.dispatcher
            .dispatch("textDocument/formatting", &uri, move |snapshot, engine, flag| {
                handlers::formatting(snapshot, &params, engine, flag)
            })
            .await
    }
}
