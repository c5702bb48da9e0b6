//! Network protocols accepted in a socket descriptor.

use strum_macros::{AsRefStr, Display, EnumString};

/// Network protocol used to dial a socket.
///
/// Names are matched case-sensitively, exactly as written in the
/// configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Tcp4,
    Tcp6,
    Udp,
    Udp4,
    Udp6,
    Ip,
    Ip4,
    Ip6,
    Unix,
    Unixgram,
    Unixpacket,
}

/// Address family restriction derived from a protocol suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    /// Either IPv4 or IPv6.
    Any,
    V4,
    V6,
}

impl AddressFamily {
    /// Whether a resolved address belongs to this family.
    pub fn matches(self, addr: &std::net::SocketAddr) -> bool {
        match self {
            Self::Any => true,
            Self::V4 => addr.is_ipv4(),
            Self::V6 => addr.is_ipv6(),
        }
    }
}

impl Protocol {
    /// Address family restriction for inet protocols.
    ///
    /// Unix-domain protocols have no inet family and return `None`.
    pub fn family(self) -> Option<AddressFamily> {
        match self {
            Self::Tcp | Self::Udp | Self::Ip => Some(AddressFamily::Any),
            Self::Tcp4 | Self::Udp4 | Self::Ip4 => Some(AddressFamily::V4),
            Self::Tcp6 | Self::Udp6 | Self::Ip6 => Some(AddressFamily::V6),
            Self::Unix | Self::Unixgram | Self::Unixpacket => None,
        }
    }

    /// Whether this protocol dials a Unix-domain socket path.
    pub fn is_unix(self) -> bool {
        self.family().is_none()
    }
}
