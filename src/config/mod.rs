//! Configuration module for the exporter.
//!
//! Provides YAML-based configuration loading for:
//! - Server settings (listen address)
//! - The `sockets` list probed on every scrape

mod app;
mod validation;

pub use app::{DEFAULT_LISTEN_ADDRESS, ExporterConfig, ServerConfig, parse_listen_address};
pub use validation::{ConfigError, expand_env_vars};
