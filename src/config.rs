use std::path::PathBuf;
use std::time::Duration;

/// Default quiet window between a document change and its re-analysis.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Default cap on handlers running concurrently on the worker pool.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 8;

/// Default coarse per-request timeout. Converts a silently hung handler
/// into an internal-error response instead of hanging the client.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Runtime tunables for the dispatcher and the diagnostics scheduler.
#[derive(Debug, Clone)]
pub struct Settings {
    pub debounce: Duration,
    pub max_concurrent_requests: usize,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// Returns the path to the data directory for bridge-lsp.
/// Uses $XDG_DATA_HOME/bridge-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/bridge-lsp,
/// or ./bridge-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file. Logging goes to a file because stdout
/// carries the protocol stream.
pub fn log_path() -> PathBuf {
    data_dir().join("bridge-lsp.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("bridge-lsp")
}
