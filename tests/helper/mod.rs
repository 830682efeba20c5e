#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tower::Service;
use tower_lsp::jsonrpc::{Request, Response};
use tower_lsp::lsp_types::*;
use tower_lsp::{ClientSocket, LspService};

use bridge_lsp::analysis::{AnalysisEngine, AnalysisError};
use bridge_lsp::cancel::{CancelFlag, Cancelled};
use bridge_lsp::config::Settings;
use bridge_lsp::lsp::backend::Backend;
use bridge_lsp::store::Snapshot;

/// Deterministic engine for end-to-end tests.
///
/// Completions answer with a single item whose label is the snapshot text,
/// which makes it visible exactly which document state a request ran
/// against. With a gate installed, completions block until the gate opens
/// or the request is cancelled. Diagnostics are counted and tagged with the
/// analyzed version.
pub struct ScriptedEngine {
    gate: Option<Arc<AtomicBool>>,
    pub saw_cancel: Arc<AtomicBool>,
    pub diagnostics_calls: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn passthrough() -> Self {
        Self {
            gate: None,
            saw_cancel: Arc::new(AtomicBool::new(false)),
            diagnostics_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Engine whose completions block until the returned gate is opened.
    pub fn gated() -> (Self, Arc<AtomicBool>) {
        let gate = Arc::new(AtomicBool::new(false));
        let engine = Self {
            gate: Some(Arc::clone(&gate)),
            saw_cancel: Arc::new(AtomicBool::new(false)),
            diagnostics_calls: Arc::new(AtomicUsize::new(0)),
        };
        (engine, gate)
    }
}

impl AnalysisEngine for ScriptedEngine {
    fn diagnostics(
        &self,
        snapshot: &Snapshot,
        _cancel: &CancelFlag,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        self.diagnostics_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Diagnostic {
            range: Range::default(),
            severity: Some(DiagnosticSeverity::INFORMATION),
            message: format!("analyzed v{}", snapshot.version()),
            ..Default::default()
        }])
    }

    fn completions(
        &self,
        snapshot: &Snapshot,
        _position: Position,
        cancel: &CancelFlag,
    ) -> Result<Vec<CompletionItem>, AnalysisError> {
        let label = snapshot.text();

        if let Some(gate) = &self.gate {
            loop {
                if cancel.is_cancelled() {
                    self.saw_cancel.store(true, Ordering::SeqCst);
                    return Err(Cancelled.into());
                }
                if gate.load(Ordering::SeqCst) {
                    break;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        }

        Ok(vec![CompletionItem {
            label,
            kind: Some(CompletionItemKind::TEXT),
            ..Default::default()
        }])
    }

    fn hover(
        &self,
        _snapshot: &Snapshot,
        _position: Position,
        _cancel: &CancelFlag,
    ) -> Result<Option<Hover>, AnalysisError> {
        Ok(None)
    }

    fn definition(
        &self,
        _snapshot: &Snapshot,
        _position: Position,
        _cancel: &CancelFlag,
    ) -> Result<Vec<Location>, AnalysisError> {
        Ok(Vec::new())
    }

    fn rename(
        &self,
        _snapshot: &Snapshot,
        _position: Position,
        _new_name: &str,
        _cancel: &CancelFlag,
    ) -> Result<Option<WorkspaceEdit>, AnalysisError> {
        Ok(None)
    }

    fn formatting(
        &self,
        _snapshot: &Snapshot,
        _options: &FormattingOptions,
        _cancel: &CancelFlag,
    ) -> Result<Vec<TextEdit>, AnalysisError> {
        Ok(Vec::new())
    }
}

pub fn test_settings(debounce_ms: u64) -> Settings {
    Settings {
        debounce: Duration::from_millis(debounce_ms),
        ..Settings::default()
    }
}

pub fn build_service(
    engine: Arc<dyn AnalysisEngine>,
    settings: Settings,
) -> (LspService<Backend>, ClientSocket) {
    LspService::build(move |client| Backend::build(client, engine.clone(), settings.clone()))
        .finish()
}

pub async fn call(service: &mut LspService<Backend>, request: Request) -> Option<Response> {
    use tower::util::ServiceExt;
    service
        .ready()
        .await
        .expect("service ready")
        .call(request)
        .await
        .expect("service call")
}

pub async fn initialize(service: &mut LspService<Backend>) {
    call(service, create_initialize_request(1)).await;
    call(service, create_initialized_notification()).await;
}

pub fn create_initialize_request(id: i64) -> Request {
    Request::build("initialize")
        .params(serde_json::to_value(InitializeParams::default()).unwrap())
        .id(id)
        .finish()
}

pub fn create_initialized_notification() -> Request {
    Request::build("initialized")
        .params(serde_json::to_value(InitializedParams {}).unwrap())
        .finish()
}

pub fn create_did_open_notification(uri: &str, text: &str, version: i32) -> Request {
    let params = DidOpenTextDocumentParams {
        text_document: TextDocumentItem {
            uri: Url::parse(uri).unwrap(),
            language_id: "python".to_string(),
            version,
            text: text.to_string(),
        },
    };
    Request::build("textDocument/didOpen")
        .params(serde_json::to_value(params).unwrap())
        .finish()
}

pub fn create_did_change_notification(
    uri: &str,
    version: i32,
    range: Option<Range>,
    text: &str,
) -> Request {
    let params = DidChangeTextDocumentParams {
        text_document: VersionedTextDocumentIdentifier {
            uri: Url::parse(uri).unwrap(),
            version,
        },
        content_changes: vec![TextDocumentContentChangeEvent {
            range,
            range_length: None,
            text: text.to_string(),
        }],
    };
    Request::build("textDocument/didChange")
        .params(serde_json::to_value(params).unwrap())
        .finish()
}

pub fn create_did_close_notification(uri: &str) -> Request {
    let params = DidCloseTextDocumentParams {
        text_document: TextDocumentIdentifier {
            uri: Url::parse(uri).unwrap(),
        },
    };
    Request::build("textDocument/didClose")
        .params(serde_json::to_value(params).unwrap())
        .finish()
}

pub fn create_completion_request(id: i64, uri: &str, line: u32, character: u32) -> Request {
    let params = CompletionParams {
        text_document_position: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: Url::parse(uri).unwrap(),
            },
            position: Position::new(line, character),
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
        context: None,
    };
    Request::build("textDocument/completion")
        .params(serde_json::to_value(params).unwrap())
        .id(id)
        .finish()
}

pub fn create_cancel_notification(id: i32) -> Request {
    let params = CancelParams {
        id: NumberOrString::Number(id),
    };
    Request::build("$/cancelRequest")
        .params(serde_json::to_value(params).unwrap())
        .finish()
}

/// Drain the client socket until a notification with the given method shows
/// up, skipping unrelated traffic such as window/logMessage.
pub async fn wait_for_notification(
    socket: &mut ClientSocket,
    method: &str,
    timeout: Duration,
) -> Option<Request> {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, socket.next()).await {
            Ok(Some(request)) if request.method() == method => return Some(request),
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => return None,
        }
    }
}

/// Keep the client socket drained so outbound notifications never block.
pub fn spawn_socket_drain(mut socket: ClientSocket) {
    tokio::spawn(async move { while socket.next().await.is_some() {} });
}

pub fn response_result(response: &Response) -> Option<Value> {
    serde_json::to_value(response)
        .ok()?
        .get("result")
        .cloned()
}

pub fn response_error_code(response: &Response) -> Option<i64> {
    serde_json::to_value(response)
        .ok()?
        .get("error")?
        .get("code")?
        .as_i64()
}
