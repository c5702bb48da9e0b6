//! Core collector traits and types.

use prometheus::core::Desc;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};
use thiserror::Error;

/// Errors raised while building or exposing metrics.
///
/// Probe failures are never reported here; they are observations.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Metric creation, registration or encoding failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Encoded exposition was not valid UTF-8.
    #[error("invalid exposition output: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Describe/collect capability of a metrics source.
///
/// The HTTP layer calls [`Collector::collect`] once per scrape and serializes
/// whatever it returns.
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Descriptors of every metric family this collector may produce.
    fn describe(&self) -> Vec<Desc>;

    /// Run one collection cycle and return the resulting families.
    async fn collect(&self) -> Vec<MetricFamily>;
}

/// Encode metric families in the Prometheus text exposition format.
pub fn encode_text(families: &[MetricFamily]) -> Result<String, CollectorError> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
