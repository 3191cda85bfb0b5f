// Remote router
//
// Implements the capability service by forwarding each logical operation to
// a running gateway over HTTP. Lets a stdio front end sit in front of one
// shared aggregation process instead of spawning its own backend pool.
use crate::protocol::*;
use crate::server::http::ErrorBody;
use crate::service::CapabilityService;
use crate::{ProxyError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

pub struct RemoteRouter {
    base_url: String,
    http: reqwest::Client,
}

impl RemoteRouter {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        cursor: Option<String>,
    ) -> Result<T> {
        let mut request = self.http.get(self.url(path));
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProxyError::Transport(format!("Gateway request failed: {}", e)))?;

        Self::decode(response).await
    }

    async fn post_json<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &P,
    ) -> Result<T> {
        let response = self
            .http
            .post(self.url(path))
            .json(params)
            .send()
            .await
            .map_err(|e| ProxyError::Transport(format!("Gateway request failed: {}", e)))?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ProxyError::Protocol(format!("Invalid gateway response: {}", e)));
        }

        let body = response.json::<ErrorBody>().await.unwrap_or(ErrorBody {
            code: -32000,
            message: format!("Gateway returned status {}", status),
        });

        Err(ProxyError::Backend {
            code: body.code,
            message: body.message,
        })
    }
}

#[async_trait]
impl CapabilityService for RemoteRouter {
    async fn list_tools(&self, params: ListToolsParams) -> Result<ListToolsResult> {
        self.get_json("/tools", params.cursor).await
    }

    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult> {
        debug!(target: "remote", tool = %params.name, "Forwarding tool call to gateway");
        self.post_json("/tool", &params).await
    }

    async fn list_prompts(&self, params: ListPromptsParams) -> Result<ListPromptsResult> {
        self.get_json("/prompts", params.cursor).await
    }

    async fn get_prompt(&self, params: GetPromptParams) -> Result<GetPromptResult> {
        debug!(target: "remote", prompt = %params.name, "Forwarding prompt request to gateway");
        self.post_json("/prompt", &params).await
    }

    async fn list_resources(&self, params: ListResourcesParams) -> Result<ListResourcesResult> {
        self.get_json("/resources", params.cursor).await
    }

    async fn read_resource(&self, params: ReadResourceParams) -> Result<ReadResourceResult> {
        debug!(target: "remote", uri = %params.uri, "Forwarding resource read to gateway");
        self.post_json("/resource", &params).await
    }

    async fn list_resource_templates(
        &self,
        params: ListResourceTemplatesParams,
    ) -> Result<ListResourceTemplatesResult> {
        self.get_json("/resource/templates", params.cursor).await
    }
}
