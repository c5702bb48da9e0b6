//! Ordered socket set, validated as a unit.

use std::collections::HashSet;

use thiserror::Error;

use super::descriptor::{SocketDescriptor, ValidationError};

/// A descriptor in the set failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("socket #{index}: {source}")]
pub struct InvalidSocket {
    /// Position of the offending entry in the `sockets` list.
    pub index: usize,
    #[source]
    pub source: ValidationError,
}

/// The full, ordered collection of validated sockets.
///
/// Built once at startup and never modified afterwards; iteration order is
/// the order of the configuration document.
#[derive(Debug, Clone, Default)]
pub struct SocketSet {
    sockets: Vec<SocketDescriptor>,
}

impl SocketSet {
    /// Validate every descriptor and build the set.
    ///
    /// # Errors
    /// Returns the first [`InvalidSocket`]; no partially validated set is
    /// ever produced.
    pub fn new(mut sockets: Vec<SocketDescriptor>) -> Result<Self, InvalidSocket> {
        for (index, socket) in sockets.iter_mut().enumerate() {
            socket
                .validate()
                .map_err(|source| InvalidSocket { index, source })?;
        }

        let mut seen = HashSet::new();
        for socket in &sockets {
            if !seen.insert(socket.name.as_str()) {
                tracing::warn!(name = %socket.name, "Duplicate socket name in configuration");
            }
        }

        Ok(Self { sockets })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SocketDescriptor> {
        self.sockets.iter()
    }

    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

impl<'a> IntoIterator for &'a SocketSet {
    type Item = &'a SocketDescriptor;
    type IntoIter = std::slice::Iter<'a, SocketDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
