// Backend channel trait
//
// The seam between the routing core and the transport. The router only ever
// talks to a backend through this trait; tests substitute in-memory fakes.
use crate::protocol::{
    CallToolParams, CallToolResult, GetPromptParams, GetPromptResult, ListPromptsResult,
    ListResourceTemplatesResult, ListResourcesResult, ListToolsResult, ReadResourceParams,
    ReadResourceResult,
};
use crate::Result;
use async_trait::async_trait;

/// Operations one live backend connection provides.
///
/// Listing calls take an optional pagination cursor and return one page.
/// `close` tears the connection down; after it returns, further calls are
/// expected to fail.
#[async_trait]
pub trait BackendChannel: Send + Sync {
    async fn list_tools(&self, cursor: Option<String>) -> Result<ListToolsResult>;

    async fn list_prompts(&self, cursor: Option<String>) -> Result<ListPromptsResult>;

    async fn list_resources(&self, cursor: Option<String>) -> Result<ListResourcesResult>;

    async fn list_resource_templates(
        &self,
        cursor: Option<String>,
    ) -> Result<ListResourceTemplatesResult>;

    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult>;

    async fn get_prompt(&self, params: GetPromptParams) -> Result<GetPromptResult>;

    async fn read_resource(&self, params: ReadResourceParams) -> Result<ReadResourceResult>;

    async fn close(&self) -> Result<()>;
}
