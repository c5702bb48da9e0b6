//! Socket descriptor: one endpoint to probe.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::protocol::Protocol;

/// Protocol applied when a descriptor leaves it empty.
pub const DEFAULT_PROTOCOL: Protocol = Protocol::Tcp;

/// Dial timeout applied when a descriptor leaves it at zero.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Errors raised while validating a single socket descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty or zero.
    #[error("all sockets must have the field '{field}' completed")]
    MissingField { field: &'static str },

    /// The protocol is not one of the dialable protocols.
    #[error("protocol '{protocol}' is not a valid one")]
    InvalidProtocol { protocol: String },
}

/// Endpoint port, written in the configuration as an integer or a string.
///
/// The textual form is kept verbatim since it is both the dial suffix and
/// the `port` metric label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPort", into = "String")]
pub struct Port(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(u64),
    Text(String),
}

impl From<RawPort> for Port {
    fn from(raw: RawPort) -> Self {
        match raw {
            RawPort::Number(n) => Self(n.to_string()),
            RawPort::Text(s) => Self(s.trim().to_string()),
        }
    }
}

impl From<Port> for String {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl From<u16> for Port {
    fn from(port: u16) -> Self {
        Self(port.to_string())
    }
}

impl From<&str> for Port {
    fn from(port: &str) -> Self {
        Self(port.trim().to_string())
    }
}

impl From<String> for Port {
    fn from(port: String) -> Self {
        Self::from(port.as_str())
    }
}

impl Port {
    /// Whether the port is empty or numerically zero.
    pub fn is_missing(&self) -> bool {
        self.0.is_empty() || matches!(self.0.parse::<u64>(), Ok(0))
    }

    /// Numeric value, if the port is written as a number.
    pub fn number(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One endpoint to probe, as read from the `sockets` list.
///
/// Optional fields are filled in by [`SocketDescriptor::validate`], which
/// must run once before the descriptor is probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketDescriptor {
    /// Identifier exposed as the `name` label.
    #[serde(default)]
    pub name: String,
    /// Hostname or IP literal.
    #[serde(default)]
    pub host: String,
    /// Endpoint port.
    #[serde(default)]
    pub port: Port,
    /// Dial protocol (default: "tcp").
    #[serde(default)]
    pub protocol: String,
    /// Dial timeout in seconds (default: 5).
    #[serde(default)]
    pub timeout: u64,
    #[serde(skip)]
    resolved: Option<Protocol>,
}

impl SocketDescriptor {
    /// Create an unvalidated descriptor with default protocol and timeout.
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: impl Into<Port>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: port.into(),
            protocol: String::new(),
            timeout: 0,
            resolved: None,
        }
    }

    /// Set the dial protocol.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self.resolved = None;
        self
    }

    /// Set the dial timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = timeout_secs;
        self
    }

    /// Check required fields and fill in defaults.
    ///
    /// # Errors
    /// Returns [`ValidationError::MissingField`] when `name`, `host` or `port`
    /// is empty, and [`ValidationError::InvalidProtocol`] for an unknown
    /// protocol.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingField { field: "name" });
        }
        if self.host.is_empty() {
            return Err(ValidationError::MissingField { field: "host" });
        }
        if self.port.is_missing() {
            return Err(ValidationError::MissingField { field: "port" });
        }

        if self.protocol.is_empty() {
            self.protocol = DEFAULT_PROTOCOL.to_string();
        }
        let protocol = Protocol::from_str(&self.protocol).map_err(|_| {
            ValidationError::InvalidProtocol {
                protocol: self.protocol.clone(),
            }
        })?;
        self.resolved = Some(protocol);

        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT_SECS;
        }
        Ok(())
    }

    /// Parsed protocol, available once the descriptor has been validated.
    pub fn dial_protocol(&self) -> Option<Protocol> {
        self.resolved
    }

    /// Dial target in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Dial timeout as a duration.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Label values in `name, host, port, protocol` order.
    pub fn label_values(&self) -> [&str; 4] {
        [&self.name, &self.host, self.port.as_str(), &self.protocol]
    }
}
