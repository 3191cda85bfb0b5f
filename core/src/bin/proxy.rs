// Switchboard stdio front end
//
// Serves MCP over the process's stdin/stdout. Aggregates a local backend
// pool by default; forwards every operation to a running gateway instead
// when SWITCHBOARD_GATEWAY_URL is set.
use std::sync::Arc;
use switchboard_core::server::stdio;
use switchboard_core::{CapabilityRouter, CapabilityService, Config, ConnectionPool, RemoteRouter};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Stdout carries the protocol; all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let gateway_url = std::env::var("SWITCHBOARD_GATEWAY_URL")
        .ok()
        .filter(|s| !s.is_empty());

    let mut pool: Option<Arc<ConnectionPool>> = None;
    let service: Arc<dyn CapabilityService> = match gateway_url {
        Some(url) => {
            info!(target: "proxy", gateway = %url, "Forwarding to remote gateway");
            Arc::new(RemoteRouter::new(url))
        }
        None => {
            let config = Config::load();
            let connected = Arc::new(ConnectionPool::connect(&config.servers).await);
            pool = Some(Arc::clone(&connected));
            Arc::new(CapabilityRouter::new(connected))
        }
    };

    tokio::select! {
        result = stdio::serve(service) => {
            if let Err(e) = result {
                error!(target: "proxy", error = %e, "Stdio server failed");
            }
        }
        _ = signal::ctrl_c() => {
            info!(target: "proxy", "Received shutdown signal");
        }
    }

    // Teardown runs exactly once; repeated signals cannot re-enter it.
    if let Some(pool) = pool {
        if let Err(e) = pool.shutdown().await {
            error!(target: "proxy", error = %e, "Pool teardown failed");
        }
    }
}
