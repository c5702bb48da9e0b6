//! Connection Status Exporter
//!
//! Probes a configured set of sockets for reachability and exposes the result
//! as the Prometheus gauge `connection_status_up{name,host,port,protocol}`,
//! `1` when a connection could be opened and `0` otherwise.
//!
//! # Architecture
//!
//! - **Socket**: validated, defaulted endpoint descriptors
//! - **Probe**: one bounded dial per socket, mapped to a binary outcome
//! - **Collector**: serialized probe pass into a private metrics registry
//! - **Config**: YAML document loading
//! - **Server**: axum router serving `/metrics`
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use connection_status_exporter::{ExporterConfig, SocketSetExporter};
//! use connection_status_exporter::server::{AppState, create_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExporterConfig::load("config/config.yaml")?;
//!     let addr = config.listen_address()?;
//!     let exporter = SocketSetExporter::new(config.into_socket_set()?)?;
//!
//!     let app = create_router(AppState { collector: Arc::new(exporter) });
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod probe;
pub mod server;
pub mod socket;

pub use collector::{Collector, CollectorError, SocketSetExporter, encode_text};
pub use config::{ConfigError, ExporterConfig};
pub use probe::{DialProber, ProbeOutcome, Prober};
pub use socket::{Port, Protocol, SocketDescriptor, SocketSet, ValidationError};
