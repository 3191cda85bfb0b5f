// Switchboard HTTP gateway
//
// Serves the aggregation surface as REST endpoints, one route per logical
// operation, on PORT (default 3001).
use std::sync::Arc;
use switchboard_core::server::http;
use switchboard_core::{CapabilityRouter, CapabilityService, Config, ConnectionPool};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();
    let pool = Arc::new(ConnectionPool::connect(&config.servers).await);
    let service: Arc<dyn CapabilityService> = Arc::new(CapabilityRouter::new(Arc::clone(&pool)));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(3001);
    let addr = format!("0.0.0.0:{}", port);

    tokio::select! {
        result = http::serve(&addr, service) => {
            if let Err(e) = result {
                error!(target: "gateway", error = %e, "Gateway server failed");
            }
        }
        _ = signal::ctrl_c() => {
            info!(target: "gateway", "Received shutdown signal");
        }
    }

    // Teardown runs exactly once; repeated signals cannot re-enter it.
    if let Err(e) = pool.shutdown().await {
        error!(target: "gateway", error = %e, "Pool teardown failed");
    }
}
