// Backend pool configuration
//
// A static TOML file lists the backend servers the proxy connects to at
// startup. A missing or malformed file yields an empty backend list, never
// a startup failure.
use crate::protocol::{DEFAULT_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the config file path
pub const CONFIG_PATH_ENV: &str = "SWITCHBOARD_CONFIG";

/// Default config file path, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "switchboard.toml";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// One backend server entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend name/identifier, used for routing provenance
    pub name: String,
    /// Command to execute (e.g., "node", "python")
    pub command: String,
    /// Arguments to pass to command
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
    /// Working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// MCP protocol version to use (defaults to latest supported)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    /// Per-request timeout in milliseconds (defaults to 30s)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl BackendConfig {
    /// Get the protocol version to use (configured or default)
    pub fn protocol_version(&self) -> &str {
        self.protocol_version
            .as_deref()
            .unwrap_or(DEFAULT_PROTOCOL_VERSION)
    }

    /// Validate the protocol version is supported
    pub fn validate_protocol_version(&self) -> Result<(), String> {
        let version = self.protocol_version();
        if SUPPORTED_PROTOCOL_VERSIONS.contains(&version) {
            Ok(())
        } else {
            Err(format!(
                "Unsupported protocol version: {}. Supported versions: {:?}",
                version, SUPPORTED_PROTOCOL_VERSIONS
            ))
        }
    }

    /// Per-request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS))
    }
}

/// Proxy configuration: the list of backend servers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub servers: Vec<BackendConfig>,
}

impl Config {
    /// Load configuration from the path in `SWITCHBOARD_CONFIG`, falling
    /// back to `./switchboard.toml`.
    pub fn load() -> Self {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!(
                target: "config",
                path = %path.display(),
                "No config file found; starting with an empty backend list"
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(
                        target: "config",
                        path = %path.display(),
                        servers = config.servers.len(),
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    warn!(
                        target: "config",
                        path = %path.display(),
                        error = %e,
                        "Failed to parse config; starting with an empty backend list"
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!(
                    target: "config",
                    path = %path.display(),
                    error = %e,
                    "Failed to read config; starting with an empty backend list"
                );
                Self::default()
            }
        }
    }
}
