//! Collector Layer
//!
//! Turns probe outcomes into Prometheus metric families on demand. Nothing is
//! probed in the background: every scrape runs one full collection cycle.
//!
//! # Architecture
//!
//! - [`Collector`]: describe/collect capability consumed by the HTTP layer
//! - [`SocketSetExporter`]: probes a [`SocketSet`](crate::socket::SocketSet)
//!   into its own registry, one cycle at a time
//! - [`encode_text`]: Prometheus text exposition of collected families
//!
//! # Example
//!
//! ```rust,no_run
//! use connection_status_exporter::{Collector, SocketDescriptor, SocketSet, SocketSetExporter};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let sockets = SocketSet::new(vec![SocketDescriptor::new("redis", "127.0.0.1", 6379u16)])?;
//! let exporter = SocketSetExporter::new(sockets)?;
//! let families = exporter.collect().await;
//! println!("{}", connection_status_exporter::encode_text(&families)?);
//! # Ok(())
//! # }
//! ```

mod exporter;
mod traits;

pub use exporter::{LABEL_NAMES, METRIC_HELP, METRIC_NAME, SocketSetExporter};
pub use traits::{Collector, CollectorError, encode_text};
