pub mod analysis;
pub mod cancel;
pub mod config;
pub mod handlers;
pub mod log;
pub mod lsp;
pub mod store;
