//! Socket set exporter.

use std::time::Instant;

use prometheus::core::{Collector as _, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts, Registry};
use tokio::sync::Mutex;

use crate::probe::{DialProber, Prober};
use crate::socket::SocketSet;

use super::traits::{Collector, CollectorError};

/// Name of the exported gauge family.
pub const METRIC_NAME: &str = "connection_status_up";

/// Help text of the exported gauge family.
pub const METRIC_HELP: &str = "Connection status of the socket.";

/// Labels identifying one socket sample.
pub const LABEL_NAMES: [&str; 4] = ["name", "host", "port", "protocol"];

/// Exporter of the connection status of a socket set.
///
/// Each [`collect`](Collector::collect) call is one full cycle: every socket
/// is probed in set order and its sample overwritten, then the registry is
/// gathered. Cycles hold an exclusive lock, so concurrent scrapes run one
/// after another and never observe a half-written cycle.
///
/// Sockets are probed sequentially, so the worst-case duration of a cycle is
/// the sum of the timeouts of all currently unreachable sockets.
pub struct SocketSetExporter<P: Prober = DialProber> {
    sockets: SocketSet,
    prober: P,
    registry: Registry,
    status: GaugeVec,
    cycle: Mutex<()>,
}

impl SocketSetExporter {
    /// Create an exporter that dials sockets over the network.
    pub fn new(sockets: SocketSet) -> Result<Self, CollectorError> {
        Self::with_prober(sockets, DialProber)
    }
}

impl<P: Prober> SocketSetExporter<P> {
    /// Create an exporter with a custom probe engine.
    pub fn with_prober(sockets: SocketSet, prober: P) -> Result<Self, CollectorError> {
        let status = GaugeVec::new(Opts::new(METRIC_NAME, METRIC_HELP), &LABEL_NAMES)?;
        let registry = Registry::new();
        registry.register(Box::new(status.clone()))?;

        Ok(Self {
            sockets,
            prober,
            registry,
            status,
            cycle: Mutex::new(()),
        })
    }

    /// Sockets probed by this exporter.
    pub fn sockets(&self) -> &SocketSet {
        &self.sockets
    }
}

impl<P: Prober> std::fmt::Debug for SocketSetExporter<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketSetExporter")
            .field("sockets", &self.sockets)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<P: Prober> Collector for SocketSetExporter<P> {
    fn describe(&self) -> Vec<Desc> {
        self.status.desc().into_iter().cloned().collect()
    }

    async fn collect(&self) -> Vec<MetricFamily> {
        let _cycle = self.cycle.lock().await;
        let start = Instant::now();

        let mut reachable = 0usize;
        for socket in &self.sockets {
            let outcome = self.prober.probe(socket).await;
            if outcome.is_reachable() {
                reachable += 1;
            }
            self.status
                .with_label_values(&socket.label_values())
                .set(outcome.value());
        }

        let families = self.registry.gather();
        tracing::debug!(
            sockets = self.sockets.len(),
            reachable,
            unreachable = self.sockets.len() - reachable,
            elapsed_ms = start.elapsed().as_millis(),
            "Collection cycle complete"
        );
        families
    }
}
