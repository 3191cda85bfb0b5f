// Backend connections
//
// Architecture:
// - `channel`: the operations one live backend connection must provide
// - `stdio`: child-process transport speaking JSON-RPC 2.0 over stdio
pub mod channel;
pub mod stdio;

pub use channel::BackendChannel;
pub use stdio::StdioChannel;

use std::sync::Arc;

/// One pooled backend: a name for provenance plus its live channel.
///
/// Owned by the `ConnectionPool`; shared read-only with the router so it can
/// issue calls. Nothing outside the pool's teardown path may close the
/// channel.
pub struct Backend {
    pub name: String,
    pub channel: Arc<dyn BackendChannel>,
}

impl Backend {
    pub fn new(name: impl Into<String>, channel: Arc<dyn BackendChannel>) -> Self {
        Self {
            name: name.into(),
            channel,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("name", &self.name).finish()
    }
}
