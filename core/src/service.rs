// Capability service trait
//
// The seven logical operations the proxy exposes, independent of the
// transport carrying them. Implemented by `CapabilityRouter` (local
// aggregation over the pool) and `RemoteRouter` (forwarding to a gateway).
use crate::protocol::{
    CallToolParams, CallToolResult, GetPromptParams, GetPromptResult, ListPromptsParams,
    ListPromptsResult, ListResourceTemplatesParams, ListResourceTemplatesResult,
    ListResourcesParams, ListResourcesResult, ListToolsParams, ListToolsResult,
    ReadResourceParams, ReadResourceResult,
};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CapabilityService: Send + Sync {
    async fn list_tools(&self, params: ListToolsParams) -> Result<ListToolsResult>;

    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult>;

    async fn list_prompts(&self, params: ListPromptsParams) -> Result<ListPromptsResult>;

    async fn get_prompt(&self, params: GetPromptParams) -> Result<GetPromptResult>;

    async fn list_resources(&self, params: ListResourcesParams) -> Result<ListResourcesResult>;

    async fn read_resource(&self, params: ReadResourceParams) -> Result<ReadResourceResult>;

    async fn list_resource_templates(
        &self,
        params: ListResourceTemplatesParams,
    ) -> Result<ListResourceTemplatesResult>;
}
