//! Socket model: the validated endpoints probed on every scrape.
//!
//! - [`Protocol`]: the fixed set of dialable network protocols
//! - [`SocketDescriptor`]: one endpoint, validated and defaulted once at load
//! - [`SocketSet`]: the ordered, immutable collection served by the exporter

mod descriptor;
mod protocol;
mod set;

pub use descriptor::{
    DEFAULT_PROTOCOL, DEFAULT_TIMEOUT_SECS, Port, SocketDescriptor, ValidationError,
};
pub use protocol::{AddressFamily, Protocol};
pub use set::{InvalidSocket, SocketSet};
