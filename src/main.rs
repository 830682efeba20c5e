use std::time::Duration;

use clap::Parser;

use bridge_lsp::config::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_REQUEST_TIMEOUT_MS, Settings,
};
use bridge_lsp::lsp::server::run_server;

/// Language server bridging editors to a host analysis engine over stdio.
#[derive(Parser)]
#[command(name = "bridge-lsp", version, about)]
struct Args {
    /// Quiet window between an edit and its re-analysis, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE_MS)]
    debounce_ms: u64,

    /// Maximum number of requests analyzed concurrently
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_REQUESTS)]
    max_concurrent_requests: usize,

    /// Per-request timeout, in milliseconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    request_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = Settings {
        debounce: Duration::from_millis(args.debounce_ms),
        max_concurrent_requests: args.max_concurrent_requests,
        request_timeout: Duration::from_millis(args.request_timeout_ms),
    };

    run_server(settings).await
}
