// Front-end adapters
//
// Architecture:
// - `stdio`: protocol-native JSON-RPC framing over the process's stdin/stdout
// - `http`: REST gateway, one route per logical operation
//
// Adapters validate inbound payloads into typed records at this boundary and
// pass them through to the capability service unmodified.
pub mod http;
pub mod stdio;

use crate::ProxyError;

/// Code and message reported to the caller for an error.
///
/// Backend-reported errors pass through with the code and message the
/// backend produced; everything else uses the proxy's own mapping.
pub(crate) fn error_payload(err: &ProxyError) -> (i32, String) {
    match err {
        ProxyError::Backend { code, message } => (*code, message.clone()),
        _ => (err.jsonrpc_code(), err.to_string()),
    }
}
