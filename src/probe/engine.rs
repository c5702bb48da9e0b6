//! Reachability probing.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, timeout};

use crate::socket::SocketDescriptor;

use super::dial::{Connection, ProbeError, dial};

/// Sample value of a reachable socket.
pub const CONNECTION_OK: f64 = 1.0;

/// Sample value of an unreachable socket.
pub const CONNECTION_ERR: f64 = 0.0;

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable,
}

impl ProbeOutcome {
    /// Gauge value for this outcome.
    pub fn value(self) -> f64 {
        match self {
            Self::Reachable => CONNECTION_OK,
            Self::Unreachable => CONNECTION_ERR,
        }
    }

    pub fn is_reachable(self) -> bool {
        self == Self::Reachable
    }
}

/// Probes one socket descriptor.
///
/// Implementations must never fail: every kind of connection error is an
/// [`ProbeOutcome::Unreachable`] observation, not an error of the prober.
#[async_trait::async_trait]
pub trait Prober: Send + Sync + 'static {
    async fn probe(&self, socket: &SocketDescriptor) -> ProbeOutcome;
}

/// Prober that dials the socket over the network.
///
/// Makes exactly one attempt bounded by the descriptor's timeout, then
/// closes whatever connection was opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialProber;

#[async_trait::async_trait]
impl Prober for DialProber {
    async fn probe(&self, socket: &SocketDescriptor) -> ProbeOutcome {
        let Some(protocol) = socket.dial_protocol() else {
            return ProbeOutcome::Unreachable;
        };

        let target = socket.address();
        let limit = socket.timeout_duration();
        let deadline = Instant::now() + limit;
        settle(socket, limit, dial(protocol, &target, &socket.port, deadline)).await
    }
}

/// Bound a dial attempt by `limit` and close the connection it yields.
///
/// Failures are not logged here; the collection cycle reports how many
/// sockets were unreachable.
async fn settle<F>(socket: &SocketDescriptor, limit: Duration, attempt: F) -> ProbeOutcome
where
    F: Future<Output = Result<Connection, ProbeError>>,
{
    let Ok(Ok(connection)) = timeout(limit, attempt).await else {
        return ProbeOutcome::Unreachable;
    };

    if let Err(e) = connection.close().await {
        tracing::warn!(name = %socket.name, target = %socket.address(), error = %e, "Error closing the socket");
    }
    ProbeOutcome::Reachable
}
