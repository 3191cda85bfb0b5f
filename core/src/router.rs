// Capability router
//
// The aggregation core. Listing requests fan out to every pooled backend
// concurrently and merge in pool order, recording which backend owns each
// advertised identifier. Invocation requests resolve the owner in the
// routing map of that kind and forward verbatim.
//
// Routing maps are instance state: one map per invokable capability kind,
// rebuilt in full on every listing call of that kind. Clear-and-repopulate
// happens under a single write lock so lookups observe either the old map
// or the new one, never a partially-built one.
use crate::backend::Backend;
use crate::pool::ConnectionPool;
use crate::protocol::*;
use crate::service::CapabilityService;
use crate::{ProxyError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

type RoutingMap = RwLock<HashMap<String, Arc<Backend>>>;

/// Aggregates capabilities across the pool and routes invocations to the
/// backend that most recently advertised the named capability.
pub struct CapabilityRouter {
    pool: Arc<ConnectionPool>,
    tools: RoutingMap,
    prompts: RoutingMap,
    resources: RoutingMap,
}

impl CapabilityRouter {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            tools: RwLock::new(HashMap::new()),
            prompts: RwLock::new(HashMap::new()),
            resources: RwLock::new(HashMap::new()),
        }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    fn ensure_open(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(ProxyError::ShuttingDown);
        }
        Ok(())
    }

    /// Issue one listing call per pooled backend, concurrently, and wait for
    /// every branch to settle. Results come back in pool order regardless of
    /// completion order, so merged output stays deterministic.
    async fn fan_out<T, F>(&self, spawn_op: F) -> Vec<(Arc<Backend>, Result<T>)>
    where
        T: Send + 'static,
        F: Fn(&Arc<Backend>) -> tokio::task::JoinHandle<Result<T>>,
    {
        let branches: Vec<_> = self
            .pool
            .backends()
            .iter()
            .map(|backend| (Arc::clone(backend), spawn_op(backend)))
            .collect();

        let mut settled = Vec::with_capacity(branches.len());
        for (backend, handle) in branches {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ProxyError::Transport(format!("listing task failed: {}", e))),
            };
            settled.push((backend, result));
        }
        settled
    }

    async fn lookup(map: &RoutingMap, id: &str) -> Option<Arc<Backend>> {
        map.read().await.get(id).cloned()
    }

    async fn repopulate(map: &RoutingMap, owners: HashMap<String, Arc<Backend>>) {
        let mut guard = map.write().await;
        guard.clear();
        guard.extend(owners);
    }
}

/// `[<backend-name>] <label>` provenance annotation for merged listings
fn provenance(backend: &str, label: Option<&str>) -> String {
    format!("[{}] {}", backend, label.unwrap_or_default())
}

#[async_trait]
impl CapabilityService for CapabilityRouter {
    async fn list_tools(&self, params: ListToolsParams) -> Result<ListToolsResult> {
        self.ensure_open()?;
        let cursor = params.cursor;

        let settled = self
            .fan_out(|backend| {
                let channel = Arc::clone(&backend.channel);
                let cursor = cursor.clone();
                tokio::spawn(async move { channel.list_tools(cursor).await })
            })
            .await;

        let mut tools = Vec::new();
        let mut owners: HashMap<String, Arc<Backend>> = HashMap::new();
        for (backend, result) in settled {
            match result {
                Ok(page) => {
                    for mut tool in page.tools {
                        owners.insert(tool.name.clone(), Arc::clone(&backend));
                        tool.description =
                            Some(provenance(&backend.name, tool.description.as_deref()));
                        tools.push(tool);
                    }
                }
                Err(e) => {
                    warn!(target: "router", backend = %backend.name, error = %e, "Failed to list tools");
                }
            }
        }

        Self::repopulate(&self.tools, owners).await;

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult> {
        self.ensure_open()?;
        let name = params.name.clone();

        let backend = Self::lookup(&self.tools, &name)
            .await
            .ok_or_else(|| ProxyError::UnknownTool(name.clone()))?;

        debug!(target: "router", backend = %backend.name, tool = %name, "Forwarding tool call");

        backend.channel.call_tool(params).await.map_err(|e| {
            warn!(target: "router", backend = %backend.name, tool = %name, error = %e, "Tool call failed");
            e
        })
    }

    async fn list_prompts(&self, params: ListPromptsParams) -> Result<ListPromptsResult> {
        self.ensure_open()?;
        let cursor = params.cursor;

        let settled = self
            .fan_out(|backend| {
                let channel = Arc::clone(&backend.channel);
                let cursor = cursor.clone();
                tokio::spawn(async move { channel.list_prompts(cursor).await })
            })
            .await;

        let mut prompts = Vec::new();
        let mut owners: HashMap<String, Arc<Backend>> = HashMap::new();
        for (backend, result) in settled {
            match result {
                Ok(page) => {
                    for mut prompt in page.prompts {
                        owners.insert(prompt.name.clone(), Arc::clone(&backend));
                        prompt.description =
                            Some(provenance(&backend.name, prompt.description.as_deref()));
                        prompts.push(prompt);
                    }
                }
                Err(e) => {
                    warn!(target: "router", backend = %backend.name, error = %e, "Failed to list prompts");
                }
            }
        }

        Self::repopulate(&self.prompts, owners).await;

        Ok(ListPromptsResult {
            prompts,
            next_cursor: cursor,
        })
    }

    async fn get_prompt(&self, params: GetPromptParams) -> Result<GetPromptResult> {
        self.ensure_open()?;
        let name = params.name.clone();

        let backend = Self::lookup(&self.prompts, &name)
            .await
            .ok_or_else(|| ProxyError::UnknownPrompt(name.clone()))?;

        debug!(target: "router", backend = %backend.name, prompt = %name, "Forwarding prompt request");

        backend.channel.get_prompt(params).await.map_err(|e| {
            warn!(target: "router", backend = %backend.name, prompt = %name, error = %e, "Prompt request failed");
            e
        })
    }

    async fn list_resources(&self, params: ListResourcesParams) -> Result<ListResourcesResult> {
        self.ensure_open()?;
        let cursor = params.cursor;

        let settled = self
            .fan_out(|backend| {
                let channel = Arc::clone(&backend.channel);
                let cursor = cursor.clone();
                tokio::spawn(async move { channel.list_resources(cursor).await })
            })
            .await;

        let mut resources = Vec::new();
        let mut owners: HashMap<String, Arc<Backend>> = HashMap::new();
        for (backend, result) in settled {
            match result {
                Ok(page) => {
                    for mut resource in page.resources {
                        owners.insert(resource.uri.clone(), Arc::clone(&backend));
                        if let Some(name) = resource.name.take() {
                            resource.name = Some(provenance(&backend.name, Some(&name)));
                        }
                        resources.push(resource);
                    }
                }
                Err(e) => {
                    warn!(target: "router", backend = %backend.name, error = %e, "Failed to list resources");
                }
            }
        }

        Self::repopulate(&self.resources, owners).await;

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
        })
    }

    async fn read_resource(&self, params: ReadResourceParams) -> Result<ReadResourceResult> {
        self.ensure_open()?;
        let uri = params.uri.clone();

        let backend = Self::lookup(&self.resources, &uri)
            .await
            .ok_or_else(|| ProxyError::UnknownResource(uri.clone()))?;

        debug!(target: "router", backend = %backend.name, uri = %uri, "Forwarding resource read");

        backend.channel.read_resource(params).await.map_err(|e| {
            warn!(target: "router", backend = %backend.name, uri = %uri, error = %e, "Resource read failed");
            e
        })
    }

    async fn list_resource_templates(
        &self,
        params: ListResourceTemplatesParams,
    ) -> Result<ListResourceTemplatesResult> {
        self.ensure_open()?;
        let cursor = params.cursor;

        let settled = self
            .fan_out(|backend| {
                let channel = Arc::clone(&backend.channel);
                let cursor = cursor.clone();
                tokio::spawn(async move { channel.list_resource_templates(cursor).await })
            })
            .await;

        // Templates are listed, never invoked, so no routing map is kept.
        let mut resource_templates = Vec::new();
        for (backend, result) in settled {
            match result {
                Ok(page) => {
                    for mut template in page.resource_templates {
                        template.name = Some(provenance(&backend.name, template.name.as_deref()));
                        if let Some(desc) = template.description.take() {
                            template.description = Some(provenance(&backend.name, Some(&desc)));
                        }
                        resource_templates.push(template);
                    }
                }
                Err(e) => {
                    warn!(target: "router", backend = %backend.name, error = %e, "Failed to list resource templates");
                }
            }
        }

        Ok(ListResourceTemplatesResult {
            resource_templates,
            next_cursor: cursor,
        })
    }
}
