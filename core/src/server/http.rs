// HTTP gateway
//
// REST front end: one route per logical operation, mirroring the stdio
// surface. Listing operations are GETs with an optional cursor query;
// invocations are POSTs with the typed params as the JSON body.
use super::error_payload;
use crate::protocol::*;
use crate::service::CapabilityService;
use crate::{ProxyError, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub type SharedService = Arc<dyn CapabilityService>;

/// Error body returned for failed operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
}

/// Build the gateway route table
pub fn app(service: SharedService) -> Router {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tool", post(call_tool))
        .route("/prompts", get(list_prompts))
        .route("/prompt", post(get_prompt))
        .route("/resources", get(list_resources))
        .route("/resource", post(read_resource))
        .route("/resource/templates", get(list_resource_templates))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(service)
}

/// Bind and serve until the task is dropped
pub async fn serve(addr: &str, service: SharedService) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(target: "gateway", addr = %addr, "Gateway listening");
    axum::serve(listener, app(service))
        .await
        .map_err(ProxyError::from)
}

fn error_response(err: ProxyError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::NOT_FOUND
    } else if matches!(err, ProxyError::ShuttingDown) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::BAD_GATEWAY
    };

    let (code, message) = error_payload(&err);
    (status, Json(ErrorBody { code, message })).into_response()
}

async fn list_tools(
    State(service): State<SharedService>,
    Query(params): Query<ListToolsParams>,
) -> Response {
    match service.list_tools(params).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

async fn call_tool(
    State(service): State<SharedService>,
    Json(params): Json<CallToolParams>,
) -> Response {
    match service.call_tool(params).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_prompts(
    State(service): State<SharedService>,
    Query(params): Query<ListPromptsParams>,
) -> Response {
    match service.list_prompts(params).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_prompt(
    State(service): State<SharedService>,
    Json(params): Json<GetPromptParams>,
) -> Response {
    match service.get_prompt(params).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_resources(
    State(service): State<SharedService>,
    Query(params): Query<ListResourcesParams>,
) -> Response {
    match service.list_resources(params).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

async fn read_resource(
    State(service): State<SharedService>,
    Json(params): Json<ReadResourceParams>,
) -> Response {
    match service.read_resource(params).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_resource_templates(
    State(service): State<SharedService>,
    Query(params): Query<ListResourceTemplatesParams>,
) -> Response {
    match service.list_resource_templates(params).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}
