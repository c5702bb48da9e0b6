//! Probe engine: one bounded connection attempt per socket.
//!
//! - [`Prober`]: capability used by the exporter to probe a descriptor
//! - [`DialProber`]: the network implementation
//! - [`ProbeOutcome`]: binary reachability result

mod dial;
mod engine;

pub use engine::{CONNECTION_ERR, CONNECTION_OK, DialProber, ProbeOutcome, Prober};
