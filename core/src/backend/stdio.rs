// Stdio backend channel
//
// Spawns the backend server as a child process and speaks line-delimited
// JSON-RPC 2.0 over its stdin/stdout, with request/response correlation and
// a per-request timeout.
use super::channel::BackendChannel;
use crate::config::BackendConfig;
use crate::protocol::*;
use crate::{ProxyError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Backend channel over a child process's stdio
pub struct StdioChannel {
    /// Backend configuration
    config: BackendConfig,
    /// Child process handle
    process: Arc<Mutex<Option<Child>>>,
    /// Stdin writer
    stdin: Arc<Mutex<Option<ChildStdin>>>,
    /// Request ID counter
    request_id: AtomicU64,
    /// Pending requests: request_id -> response channel
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>,
    /// Server info after initialization
    server_info: Arc<Mutex<Option<ServerInfo>>>,
}

impl StdioChannel {
    /// Spawn the backend process and run the initialization handshake.
    pub async fn connect(config: BackendConfig) -> Result<Self> {
        info!(
            target: "stdio_channel",
            backend = %config.name,
            command = %config.command,
            "Connecting to backend"
        );

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(ref env) = config.env {
            for (key, val) in env {
                cmd.env(key, val);
            }
        }

        if let Some(ref cwd) = config.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            error!(target: "stdio_channel", backend = %config.name, error = %e, "Failed to spawn backend process");
            ProxyError::Transport(format!("Failed to spawn process: {}", e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProxyError::Transport("Failed to capture stdin".to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProxyError::Transport("Failed to capture stdout".to_string()))?;

        let channel = Self {
            config,
            process: Arc::new(Mutex::new(Some(child))),
            stdin: Arc::new(Mutex::new(Some(stdin))),
            request_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            server_info: Arc::new(Mutex::new(None)),
        };

        channel.spawn_reader(stdout);

        let init_result = channel.initialize().await?;
        *channel.server_info.lock().await = Some(init_result.server_info.clone());

        info!(
            target: "stdio_channel",
            backend = %channel.config.name,
            server_name = %init_result.server_info.name,
            server_version = %init_result.server_info.version,
            "Backend connected and initialized"
        );

        Ok(channel)
    }

    /// Send initialize request and the initialized notification
    async fn initialize(&self) -> Result<InitializeResult> {
        let params = InitializeParams {
            protocol_version: self.config.protocol_version().to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: "switchboard".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        let result = self.send_request("initialize", Some(json!(params))).await?;

        let init_result: InitializeResult = serde_json::from_value(result)
            .map_err(|e| ProxyError::Protocol(format!("Invalid initialize result: {}", e)))?;

        self.send_notification("notifications/initialized", None)
            .await?;

        Ok(init_result)
    }

    /// Server info reported during initialization
    pub async fn server_info(&self) -> Option<ServerInfo> {
        self.server_info.lock().await.clone()
    }

    /// Send a JSON-RPC request and wait for the correlated response
    async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();

        self.pending.lock().await.insert(id, tx);

        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(id)),
            method: method.to_string(),
            params,
        };

        self.write_message(&request).await?;

        let response = timeout(self.config.request_timeout(), rx)
            .await
            .map_err(|_| {
                warn!(target: "stdio_channel", backend = %self.config.name, method = %method, "Request timeout");
                ProxyError::Timeout
            })?
            .map_err(|_| ProxyError::Transport("Response channel closed".to_string()))?;

        if let Some(error) = response.error {
            return Err(ProxyError::Backend {
                code: error.code,
                message: error.message,
            });
        }

        response
            .result
            .ok_or_else(|| ProxyError::Protocol("Missing result in response".to_string()))
    }

    /// Send a JSON-RPC notification (no response expected)
    async fn send_notification(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<()> {
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.to_string(),
            params,
        };

        self.write_message(&notification).await
    }

    async fn write_message(&self, message: &JsonRpcRequest) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let mut stdin_guard = self.stdin.lock().await;
        let stdin = stdin_guard
            .as_mut()
            .ok_or_else(|| ProxyError::Transport("Connection closed".to_string()))?;

        stdin.write_all(line.as_bytes()).await.map_err(|e| {
            error!(target: "stdio_channel", backend = %self.config.name, error = %e, "Failed to write request");
            ProxyError::Io(e)
        })?;

        stdin.flush().await.map_err(|e| {
            error!(target: "stdio_channel", backend = %self.config.name, error = %e, "Failed to flush stdin");
            ProxyError::Io(e)
        })?;

        Ok(())
    }

    /// Spawn stdout reader task
    fn spawn_reader(&self, stdout: ChildStdout) {
        let pending = Arc::clone(&self.pending);
        let backend_name = self.config.name.clone();

        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<JsonRpcResponse>(&line) {
                    Ok(response) => {
                        if let Some(id) = response.id.as_u64() {
                            if let Some(tx) = pending.lock().await.remove(&id) {
                                let _ = tx.send(response);
                            } else {
                                warn!(
                                    target: "stdio_channel",
                                    backend = %backend_name,
                                    id = id,
                                    "Received response for unknown request"
                                );
                            }
                        }
                    }
                    Err(_) => {
                        // Server-initiated notifications are not correlated
                        debug!(
                            target: "stdio_channel",
                            backend = %backend_name,
                            line = %line,
                            "Ignoring non-response message"
                        );
                    }
                }
            }

            debug!(target: "stdio_channel", backend = %backend_name, "Stdout reader exited");
        });
    }

    async fn request_typed<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<T> {
        let result = self.send_request(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| ProxyError::Protocol(format!("Invalid {} result: {}", method, e)))
    }
}

#[async_trait]
impl BackendChannel for StdioChannel {
    async fn list_tools(&self, cursor: Option<String>) -> Result<ListToolsResult> {
        debug!(target: "stdio_channel", backend = %self.config.name, "Listing tools");
        let params = ListToolsParams { cursor };
        self.request_typed("tools/list", Some(json!(params))).await
    }

    async fn list_prompts(&self, cursor: Option<String>) -> Result<ListPromptsResult> {
        debug!(target: "stdio_channel", backend = %self.config.name, "Listing prompts");
        let params = ListPromptsParams { cursor };
        self.request_typed("prompts/list", Some(json!(params))).await
    }

    async fn list_resources(&self, cursor: Option<String>) -> Result<ListResourcesResult> {
        debug!(target: "stdio_channel", backend = %self.config.name, "Listing resources");
        let params = ListResourcesParams { cursor };
        self.request_typed("resources/list", Some(json!(params)))
            .await
    }

    async fn list_resource_templates(
        &self,
        cursor: Option<String>,
    ) -> Result<ListResourceTemplatesResult> {
        debug!(target: "stdio_channel", backend = %self.config.name, "Listing resource templates");
        let params = ListResourceTemplatesParams { cursor };
        self.request_typed("resources/templates/list", Some(json!(params)))
            .await
    }

    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult> {
        debug!(target: "stdio_channel", backend = %self.config.name, tool = %params.name, "Calling tool");
        self.request_typed("tools/call", Some(json!(params))).await
    }

    async fn get_prompt(&self, params: GetPromptParams) -> Result<GetPromptResult> {
        debug!(target: "stdio_channel", backend = %self.config.name, prompt = %params.name, "Getting prompt");
        self.request_typed("prompts/get", Some(json!(params))).await
    }

    async fn read_resource(&self, params: ReadResourceParams) -> Result<ReadResourceResult> {
        debug!(target: "stdio_channel", backend = %self.config.name, uri = %params.uri, "Reading resource");
        self.request_typed("resources/read", Some(json!(params)))
            .await
    }

    async fn close(&self) -> Result<()> {
        info!(target: "stdio_channel", backend = %self.config.name, "Closing backend connection");

        // Close stdin to signal shutdown
        if let Some(mut stdin) = self.stdin.lock().await.take() {
            let _ = stdin.shutdown().await;
        }

        // Kill process if still running
        if let Some(mut child) = self.process.lock().await.take() {
            let _ = child.kill().await;
            let _ = child.wait().await;
        }

        Ok(())
    }
}
