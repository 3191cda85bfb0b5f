// Connection pool
//
// Builds the backend list from configuration and owns connection lifetime.
// Connect attempts are independent: one failing backend never aborts pool
// construction. Teardown stops new calls first, then closes every
// connection regardless of in-flight state.
use crate::backend::{Backend, StdioChannel};
use crate::config::BackendConfig;
use crate::{ProxyError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Pool of live backend connections, in configuration order
pub struct ConnectionPool {
    backends: Vec<Arc<Backend>>,
    closed: AtomicBool,
}

impl ConnectionPool {
    /// Connect to every configured backend, skipping the ones that fail.
    pub async fn connect(configs: &[BackendConfig]) -> Self {
        let mut backends = Vec::new();

        for config in configs {
            if let Err(e) = config.validate_protocol_version() {
                error!(
                    target: "pool",
                    backend = %config.name,
                    error = %e,
                    "Skipping backend with invalid protocol version"
                );
                continue;
            }

            match StdioChannel::connect(config.clone()).await {
                Ok(channel) => {
                    backends.push(Arc::new(Backend::new(config.name.clone(), Arc::new(channel))));
                }
                Err(e) => {
                    error!(
                        target: "pool",
                        backend = %config.name,
                        error = %e,
                        "Failed to connect to backend"
                    );
                }
            }
        }

        info!(target: "pool", connected = backends.len(), configured = configs.len(), "Backend pool ready");

        Self::from_backends(backends)
    }

    /// Build a pool from already-established backends (pool order is the
    /// given order).
    pub fn from_backends(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            backends,
            closed: AtomicBool::new(false),
        }
    }

    /// Live backends in registration order
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// True once teardown has begun
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Tear the pool down: stop accepting new calls, then close every
    /// connection. Individual close failures are logged and teardown keeps
    /// going; the overall result is an error only if every close failed.
    /// A second call is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!(target: "pool", "Shutdown already performed");
            return Ok(());
        }

        info!(target: "pool", backends = self.backends.len(), "Shutting down backend pool");

        let mut failures = 0;
        for backend in &self.backends {
            debug!(target: "pool", backend = %backend.name, "Closing backend connection");
            if let Err(e) = backend.channel.close().await {
                warn!(
                    target: "pool",
                    backend = %backend.name,
                    error = %e,
                    "Failed to close backend connection"
                );
                failures += 1;
            }
        }

        if !self.backends.is_empty() && failures == self.backends.len() {
            return Err(ProxyError::Teardown(format!(
                "all {} connection(s) failed to close",
                failures
            )));
        }

        info!(target: "pool", failures, "Backend pool shutdown complete");
        Ok(())
    }
}
