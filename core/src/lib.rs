// Switchboard Core Library
// Capability aggregation proxy: one MCP endpoint fronting a pool of backends

pub mod backend;
pub mod config;
pub mod pool;
pub mod protocol;
pub mod remote;
pub mod router;
pub mod server;
pub mod service;

// Export core types
pub use backend::{Backend, BackendChannel, StdioChannel};
pub use config::{BackendConfig, Config};
pub use pool::ConnectionPool;
pub use remote::RemoteRouter;
pub use router::CapabilityRouter;
pub use service::CapabilityService;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Backend error {code}: {message}")]
    Backend { code: i32, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Proxy is shutting down")]
    ShuttingDown,

    #[error("Teardown failed: {0}")]
    Teardown(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

impl ProxyError {
    /// JSON-RPC error code reported to the caller.
    ///
    /// Backend errors keep the code the backend returned; unknown-capability
    /// errors are invalid params (a caller mistake, not a backend fault).
    pub fn jsonrpc_code(&self) -> i32 {
        match self {
            ProxyError::UnknownTool(_)
            | ProxyError::UnknownPrompt(_)
            | ProxyError::UnknownResource(_)
            | ProxyError::InvalidParams(_) => protocol::INVALID_PARAMS,
            ProxyError::Backend { code, .. } => *code,
            ProxyError::Json(_) | ProxyError::Protocol(_) => protocol::INTERNAL_ERROR,
            _ => -32000,
        }
    }

    /// True for errors caused by the caller rather than a backend
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProxyError::UnknownTool(_)
                | ProxyError::UnknownPrompt(_)
                | ProxyError::UnknownResource(_)
        )
    }
}
