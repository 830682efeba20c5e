// LSP protocol layer
// - server.rs: server bootstrap over stdio
// - backend.rs: LanguageServer trait implementation
// - dispatcher.rs: request scheduling, cancellation wiring, error mapping
// - diagnostics.rs: debounced push diagnostics

pub mod backend;
pub mod diagnostics;
pub mod dispatcher;
pub mod server;
