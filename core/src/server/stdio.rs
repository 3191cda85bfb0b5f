// Stdio front end
//
// Serves the proxy over the process's own stdin/stdout with line-delimited
// JSON-RPC framing: one request per line in, one response per line out.
// Notifications never produce a response.
use super::error_payload;
use crate::protocol::*;
use crate::service::CapabilityService;
use crate::{ProxyError, Result};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Name the proxy reports in the initialize handshake
pub const SERVER_NAME: &str = "switchboard";

/// Read requests from stdin and write responses to stdout until stdin
/// closes. Logging must go to stderr; stdout is the protocol channel.
pub async fn serve(service: std::sync::Arc<dyn CapabilityService>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    info!(target: "stdio_server", "Serving MCP over stdio");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => dispatch(service.as_ref(), request).await,
            Err(e) => {
                warn!(target: "stdio_server", error = %e, "Failed to parse request");
                Some(error_response(
                    serde_json::Value::Null,
                    PARSE_ERROR,
                    &format!("Parse error: {}", e),
                ))
            }
        };

        if let Some(response) = response {
            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    info!(target: "stdio_server", "Stdin closed; stopping");
    Ok(())
}

/// Map one inbound request onto the capability service.
///
/// Returns `None` for notifications. Unknown methods answer with
/// `-32601`; malformed params with `-32602`.
pub async fn dispatch(
    service: &dyn CapabilityService,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let id = match request.id {
        Some(id) => id,
        None => {
            debug!(target: "stdio_server", method = %request.method, "Ignoring notification");
            return None;
        }
    };

    let params = request.params.unwrap_or_else(|| json!({}));

    let result: Result<serde_json::Value> = match request.method.as_str() {
        "initialize" => to_value(initialize_result()),
        "ping" => Ok(json!({})),
        "tools/list" => match parse_params::<ListToolsParams>(params) {
            Ok(p) => match service.list_tools(p).await {
                Ok(r) => to_value(r),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        "tools/call" => match parse_params::<CallToolParams>(params) {
            Ok(p) => match service.call_tool(p).await {
                Ok(r) => to_value(r),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        "prompts/list" => match parse_params::<ListPromptsParams>(params) {
            Ok(p) => match service.list_prompts(p).await {
                Ok(r) => to_value(r),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        "prompts/get" => match parse_params::<GetPromptParams>(params) {
            Ok(p) => match service.get_prompt(p).await {
                Ok(r) => to_value(r),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        "resources/list" => match parse_params::<ListResourcesParams>(params) {
            Ok(p) => match service.list_resources(p).await {
                Ok(r) => to_value(r),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        "resources/read" => match parse_params::<ReadResourceParams>(params) {
            Ok(p) => match service.read_resource(p).await {
                Ok(r) => to_value(r),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        "resources/templates/list" => match parse_params::<ListResourceTemplatesParams>(params) {
            Ok(p) => match service.list_resource_templates(p).await {
                Ok(r) => to_value(r),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        other => {
            return Some(error_response(
                id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", other),
            ));
        }
    };

    Some(match result {
        Ok(value) => ok_response(id, value),
        Err(e) => {
            let (code, message) = error_payload(&e);
            error_response(id, code, &message)
        }
    })
}

/// Capabilities and identity reported to the connecting client
fn initialize_result() -> InitializeResult {
    InitializeResult {
        protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability::default()),
            prompts: Some(PromptsCapability::default()),
            resources: Some(ResourcesCapability {
                subscribe: Some(true),
                list_changed: None,
            }),
            experimental: None,
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: serde_json::Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| ProxyError::InvalidParams(e.to_string()))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(ProxyError::from)
}

fn ok_response(id: serde_json::Value, result: serde_json::Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: Some(result),
        error: None,
    }
}

fn error_response(id: serde_json::Value, code: i32, message: &str) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        }),
    }
}
