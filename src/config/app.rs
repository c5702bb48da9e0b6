//! Exporter configuration document.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::socket::{SocketDescriptor, SocketSet};

use super::validation::{ConfigError, expand_env_vars};

/// Default HTTP listen address (all interfaces, port 8888).
pub const DEFAULT_LISTEN_ADDRESS: &str = ":8888";

fn default_listen_address() -> String {
    DEFAULT_LISTEN_ADDRESS.to_string()
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (default: ":8888").
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
        }
    }
}

/// Parse a listen address.
///
/// A bare `:port` listens on all interfaces.
pub fn parse_listen_address(address: &str) -> Result<SocketAddr, ConfigError> {
    let address = address.trim();
    let normalized = match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => address.to_string(),
    };
    normalized
        .parse()
        .map_err(|_| ConfigError::InvalidListenAddress(address.to_string()))
}

// =============================================================================
// Exporter Configuration
// =============================================================================

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Sockets to probe, in probing order.
    #[serde(default)]
    pub sockets: Vec<SocketDescriptor>,
}

impl ExporterConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment variables are expanded before parsing. Socket entries are
    /// not validated here; see [`ExporterConfig::into_socket_set`].
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    /// Parsed listen address of the HTTP server.
    pub fn listen_address(&self) -> Result<SocketAddr, ConfigError> {
        parse_listen_address(&self.server.listen_address)
    }

    /// Validate every socket and build the socket set.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` for the first invalid socket.
    pub fn into_socket_set(self) -> Result<SocketSet, ConfigError> {
        Ok(SocketSet::new(self.sockets)?)
    }
}
