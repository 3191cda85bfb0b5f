// Shared test support: in-memory backend channels
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use switchboard_core::backend::{Backend, BackendChannel};
use switchboard_core::pool::ConnectionPool;
use switchboard_core::protocol::*;
use switchboard_core::{ProxyError, Result};

/// Scripted backend channel. Listing answers come from the configured
/// capability sets; invocations are recorded so tests can assert routing.
#[derive(Default)]
pub struct FakeChannel {
    tools: Mutex<Vec<Tool>>,
    prompts: Vec<Prompt>,
    resources: Vec<Resource>,
    templates: Vec<ResourceTemplate>,
    fail_listing: AtomicBool,
    fail_invoke: bool,
    fail_close: bool,
    delay_ms: u64,
    calls: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools(self, tools: Vec<Tool>) -> Self {
        *self.tools.lock().unwrap() = tools;
        self
    }

    pub fn with_prompts(mut self, prompts: Vec<Prompt>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_templates(mut self, templates: Vec<ResourceTemplate>) -> Self {
        self.templates = templates;
        self
    }

    pub fn failing_listing(self) -> Self {
        self.fail_listing.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_invoke(mut self) -> Self {
        self.fail_invoke = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Delay every listing answer, to prove merge order is pool order
    /// rather than completion order.
    pub fn delayed(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Replace the advertised tools after construction
    pub fn set_tools(&self, tools: Vec<Tool>) {
        *self.tools.lock().unwrap() = tools;
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn listing_guard(&self) -> Result<()> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ProxyError::Transport("listing failed".to_string()));
        }
        Ok(())
    }

    fn record(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl BackendChannel for FakeChannel {
    async fn list_tools(&self, _cursor: Option<String>) -> Result<ListToolsResult> {
        self.pause().await;
        self.listing_guard()?;
        Ok(ListToolsResult {
            tools: self.tools.lock().unwrap().clone(),
            next_cursor: None,
        })
    }

    async fn list_prompts(&self, _cursor: Option<String>) -> Result<ListPromptsResult> {
        self.pause().await;
        self.listing_guard()?;
        Ok(ListPromptsResult {
            prompts: self.prompts.clone(),
            next_cursor: None,
        })
    }

    async fn list_resources(&self, _cursor: Option<String>) -> Result<ListResourcesResult> {
        self.pause().await;
        self.listing_guard()?;
        Ok(ListResourcesResult {
            resources: self.resources.clone(),
            next_cursor: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _cursor: Option<String>,
    ) -> Result<ListResourceTemplatesResult> {
        self.pause().await;
        self.listing_guard()?;
        Ok(ListResourceTemplatesResult {
            resource_templates: self.templates.clone(),
            next_cursor: None,
        })
    }

    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult> {
        self.record(format!("tools/call:{}", params.name));
        if self.fail_invoke {
            return Err(ProxyError::Backend {
                code: -32050,
                message: "invoke failed".to_string(),
            });
        }
        Ok(CallToolResult {
            content: vec![ToolContent::Text {
                text: format!("{} handled", params.name),
            }],
            is_error: None,
        })
    }

    async fn get_prompt(&self, params: GetPromptParams) -> Result<GetPromptResult> {
        self.record(format!("prompts/get:{}", params.name));
        if self.fail_invoke {
            return Err(ProxyError::Backend {
                code: -32050,
                message: "invoke failed".to_string(),
            });
        }
        Ok(GetPromptResult {
            description: None,
            messages: vec![],
        })
    }

    async fn read_resource(&self, params: ReadResourceParams) -> Result<ReadResourceResult> {
        self.record(format!("resources/read:{}", params.uri));
        if self.fail_invoke {
            return Err(ProxyError::Backend {
                code: -32050,
                message: "invoke failed".to_string(),
            });
        }
        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: params.uri,
                mime_type: Some("text/plain".to_string()),
                text: Some("contents".to_string()),
                blob: None,
            }],
        })
    }

    async fn close(&self) -> Result<()> {
        self.record("close".to_string());
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(ProxyError::Transport("close failed".to_string()));
        }
        Ok(())
    }
}

pub fn tool(name: &str, description: &str) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: serde_json::json!({"type": "object"}),
    }
}

pub fn prompt(name: &str, description: &str) -> Prompt {
    Prompt {
        name: name.to_string(),
        description: Some(description.to_string()),
        arguments: None,
    }
}

pub fn resource(uri: &str, name: &str) -> Resource {
    Resource {
        uri: uri.to_string(),
        name: Some(name.to_string()),
        description: None,
        mime_type: None,
    }
}

pub fn template(uri_template: &str, name: &str) -> ResourceTemplate {
    ResourceTemplate {
        uri_template: uri_template.to_string(),
        name: Some(name.to_string()),
        description: None,
        mime_type: None,
    }
}

pub fn backend(name: &str, channel: &Arc<FakeChannel>) -> Arc<Backend> {
    Arc::new(Backend::new(
        name,
        Arc::clone(channel) as Arc<dyn BackendChannel>,
    ))
}

pub fn pool_of(backends: Vec<Arc<Backend>>) -> Arc<ConnectionPool> {
    Arc::new(ConnectionPool::from_backends(backends))
}
