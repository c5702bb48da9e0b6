//! Protocol-specific dialing.
//!
//! Every dial is a single attempt that stays inside the caller's future, so
//! dropping that future abandons the attempt. When a name resolves to several
//! addresses, the time left before the deadline is shared between them.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use socket2::{Domain, SockAddr, Socket, Type};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::{Instant, timeout};

use crate::socket::{AddressFamily, Port, Protocol};

/// Why a single dial attempt failed.
///
/// Never leaves the probe engine; every variant maps to an unreachable
/// outcome.
#[derive(Debug, Error)]
pub(crate) enum ProbeError {
    #[error("resolve failed: {0}")]
    Resolve(#[source] io::Error),

    #[error("no {0:?} address found")]
    NoAddress(AddressFamily),

    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("unsupported target: {0}")]
    Unsupported(String),
}

/// An open connection, held only long enough to be closed again.
#[derive(Debug)]
pub(crate) enum Connection {
    Tcp(TcpStream),
    Udp(UdpSocket),
    Raw(Socket),
    #[cfg(unix)]
    Unix(tokio::net::UnixStream),
    #[cfg(unix)]
    UnixDatagram(tokio::net::UnixDatagram),
    #[cfg(unix)]
    SeqPacket(Socket),
}

impl Connection {
    /// Close the connection.
    ///
    /// Stream sockets are shut down explicitly so that a failure can be
    /// reported; the descriptor is released on drop either way.
    pub(crate) async fn close(self) -> io::Result<()> {
        match self {
            Self::Tcp(mut stream) => stream.shutdown().await,
            Self::Udp(socket) => {
                drop(socket);
                Ok(())
            }
            Self::Raw(socket) => {
                drop(socket);
                Ok(())
            }
            #[cfg(unix)]
            Self::Unix(mut stream) => stream.shutdown().await,
            #[cfg(unix)]
            Self::UnixDatagram(socket) => {
                drop(socket);
                Ok(())
            }
            #[cfg(unix)]
            Self::SeqPacket(socket) => socket.shutdown(std::net::Shutdown::Both),
        }
    }
}

/// Shortest time a single candidate address gets, unless less than that
/// remains before the deadline.
const MIN_ATTEMPT: Duration = Duration::from_secs(2);

/// Dial `address` (in `host:port` form) with the given protocol.
///
/// `deadline` bounds the whole dial, including every resolved candidate.
pub(crate) async fn dial(
    protocol: Protocol,
    address: &str,
    port: &Port,
    deadline: Instant,
) -> Result<Connection, ProbeError> {
    match protocol.family() {
        Some(family) => {
            let candidates = resolve(address, family).await?;
            match protocol {
                Protocol::Tcp | Protocol::Tcp4 | Protocol::Tcp6 => {
                    connect_any(&candidates, deadline, |addr| TcpStream::connect(addr))
                        .await
                        .map(Connection::Tcp)
                }
                Protocol::Udp | Protocol::Udp4 | Protocol::Udp6 => {
                    connect_any(&candidates, deadline, connect_udp)
                        .await
                        .map(Connection::Udp)
                }
                _ => dial_raw(candidates[0], port).await,
            }
        }
        None => dial_unix(protocol, address).await,
    }
}

async fn resolve(address: &str, family: AddressFamily) -> Result<Vec<SocketAddr>, ProbeError> {
    let candidates: Vec<SocketAddr> = tokio::net::lookup_host(address)
        .await
        .map_err(ProbeError::Resolve)?
        .filter(|addr| family.matches(addr))
        .collect();

    if candidates.is_empty() {
        return Err(ProbeError::NoAddress(family));
    }
    Ok(candidates)
}

/// Time allotted to the next candidate when `left` candidates remain.
fn attempt_budget(remaining: Duration, left: usize) -> Duration {
    let share = remaining / u32::try_from(left.max(1)).unwrap_or(u32::MAX);
    if share >= MIN_ATTEMPT {
        share
    } else {
        remaining.min(MIN_ATTEMPT)
    }
}

/// Try each candidate in order until one connects or the deadline passes.
///
/// A candidate that hangs only consumes its own share of the remaining time,
/// so a blackholed first address does not starve the ones after it.
async fn connect_any<T, F, Fut>(
    candidates: &[SocketAddr],
    deadline: Instant,
    mut connect: F,
) -> Result<T, ProbeError>
where
    F: FnMut(SocketAddr) -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let mut last_err = None;
    for (i, addr) in candidates.iter().enumerate() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        let budget = attempt_budget(remaining, candidates.len() - i);
        match timeout(budget, connect(*addr)).await {
            Ok(Ok(conn)) => return Ok(conn),
            Ok(Err(e)) => last_err = Some(e),
            Err(_) => {
                last_err = Some(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out"),
                ))
            }
        }
    }
    Err(connect_error(last_err))
}

async fn connect_udp(addr: SocketAddr) -> io::Result<UdpSocket> {
    let local: SocketAddr = if addr.is_ipv4() {
        ([0, 0, 0, 0], 0).into()
    } else {
        ([0u16; 8], 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(addr).await?;
    Ok(socket)
}

/// Raw IP socket whose IP protocol number is the descriptor's port.
async fn dial_raw(addr: SocketAddr, port: &Port) -> Result<Connection, ProbeError> {
    let number = port
        .number()
        .and_then(|n| i32::try_from(n).ok())
        .filter(|n| *n <= 255)
        .ok_or_else(|| ProbeError::Unsupported(format!("ip protocol number '{port}'")))?;

    let socket = Socket::new(
        Domain::for_address(addr),
        Type::RAW,
        Some(socket2::Protocol::from(number)),
    )
    .map_err(ProbeError::Connect)?;

    connect_socket(socket, &SockAddr::from(addr))
        .await
        .map(Connection::Raw)
        .map_err(ProbeError::Connect)
}

#[cfg(unix)]
async fn dial_unix(protocol: Protocol, path: &str) -> Result<Connection, ProbeError> {
    match protocol {
        Protocol::Unix => tokio::net::UnixStream::connect(path)
            .await
            .map(Connection::Unix)
            .map_err(ProbeError::Connect),
        Protocol::Unixgram => {
            let socket = tokio::net::UnixDatagram::unbound().map_err(ProbeError::Connect)?;
            socket.connect(path).map_err(ProbeError::Connect)?;
            Ok(Connection::UnixDatagram(socket))
        }
        _ => {
            let socket =
                Socket::new(Domain::UNIX, Type::SEQPACKET, None).map_err(ProbeError::Connect)?;
            let addr = SockAddr::unix(path).map_err(ProbeError::Connect)?;
            connect_socket(socket, &addr)
                .await
                .map(Connection::SeqPacket)
                .map_err(ProbeError::Connect)
        }
    }
}

#[cfg(not(unix))]
async fn dial_unix(protocol: Protocol, _path: &str) -> Result<Connection, ProbeError> {
    Err(ProbeError::Unsupported(format!(
        "{protocol} sockets on this platform"
    )))
}

/// Connect a `socket2` socket without blocking a thread.
///
/// A connect that cannot finish immediately is awaited through the reactor.
/// A full unix-domain backlog surfaces as `WouldBlock` and leaves the socket
/// unconnected, which the peer check turns into an error.
#[cfg(unix)]
async fn connect_socket(socket: Socket, addr: &SockAddr) -> io::Result<Socket> {
    use tokio::io::Interest;
    use tokio::io::unix::AsyncFd;

    socket.set_nonblocking(true)?;
    match socket.connect(addr) {
        Ok(()) => return Ok(socket),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
        Err(e) => return Err(e),
    }

    let fd = AsyncFd::with_interest(socket, Interest::WRITABLE)?;
    drop(fd.writable().await?);
    let socket = fd.into_inner();

    if let Some(e) = socket.take_error()? {
        return Err(e);
    }
    socket.peer_addr()?;
    Ok(socket)
}

#[cfg(not(unix))]
async fn connect_socket(socket: Socket, addr: &SockAddr) -> io::Result<Socket> {
    socket.set_nonblocking(true)?;
    socket.connect(addr)?;
    Ok(socket)
}

fn connect_error(last: Option<io::Error>) -> ProbeError {
    ProbeError::Connect(
        last.unwrap_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "no address to dial")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tokio::net::TcpListener;

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_dial_tcp_listener() {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => return,
            Err(e) => panic!("Failed to bind test listener: {e}"),
        };
        let addr = listener.local_addr().unwrap();

        let conn = dial(
            Protocol::Tcp4,
            &addr.to_string(),
            &Port::from(addr.port()),
            far_deadline(),
        )
        .await
        .unwrap();
        assert!(matches!(conn, Connection::Tcp(_)));
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_dial_tcp6_rejects_ipv4_literal() {
        let result = dial(
            Protocol::Tcp6,
            "127.0.0.1:80",
            &Port::from(80u16),
            far_deadline(),
        )
        .await;
        assert!(matches!(result, Err(ProbeError::NoAddress(AddressFamily::V6))));
    }

    #[tokio::test]
    async fn test_dial_udp_connects_without_listener() {
        let conn = dial(Protocol::Udp, "127.0.0.1:9", &Port::from(9u16), far_deadline())
            .await
            .unwrap();
        assert!(matches!(conn, Connection::Udp(_)));
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_dial_unresolvable_host() {
        let result = dial(
            Protocol::Tcp,
            "host.invalid:80",
            &Port::from(80u16),
            far_deadline(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dial_raw_rejects_large_protocol_number() {
        let result = dial(
            Protocol::Ip4,
            "127.0.0.1:300",
            &Port::from(300u16),
            far_deadline(),
        )
        .await;
        assert!(matches!(result, Err(ProbeError::Unsupported(_))));
    }

    #[test]
    fn test_attempt_budget() {
        let secs = Duration::from_secs;
        assert_eq!(attempt_budget(secs(10), 2), secs(5));
        assert_eq!(attempt_budget(secs(10), 1), secs(10));
        // Never below two seconds while that much time is left
        assert_eq!(attempt_budget(secs(5), 4), secs(2));
        assert_eq!(attempt_budget(secs(1), 3), secs(1));
        assert_eq!(attempt_budget(secs(3), 0), secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_any_skips_hanging_candidate() {
        let dropped: SocketAddr = "[2001:db8::1]:80".parse().unwrap();
        let live: SocketAddr = "192.0.2.10:80".parse().unwrap();

        let start = Instant::now();
        let deadline = start + Duration::from_secs(5);
        let reached = connect_any(&[dropped, live], deadline, move |addr| async move {
            if addr == dropped {
                std::future::pending::<io::Result<SocketAddr>>().await
            } else {
                Ok(addr)
            }
        })
        .await
        .unwrap();

        assert_eq!(reached, live);
        assert_eq!(start.elapsed(), Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_any_stops_at_deadline() {
        let candidates: Vec<SocketAddr> = vec![
            "192.0.2.1:80".parse().unwrap(),
            "192.0.2.2:80".parse().unwrap(),
        ];
        let tried = std::sync::Mutex::new(Vec::new());

        let start = Instant::now();
        let result = connect_any(&candidates, start + Duration::from_secs(1), |addr| {
            tried.lock().unwrap().push(addr);
            std::future::pending::<io::Result<()>>()
        })
        .await;

        // Under the two second floor the first candidate keeps the whole budget
        assert!(matches!(result, Err(ProbeError::Connect(ref e)) if e.kind() == ErrorKind::TimedOut));
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(*tried.lock().unwrap(), vec![candidates[0]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_any_reports_last_error() {
        let candidates: Vec<SocketAddr> = vec![
            "192.0.2.1:80".parse().unwrap(),
            "192.0.2.2:80".parse().unwrap(),
        ];

        let result = connect_any(&candidates, far_deadline(), |_| async {
            Err::<(), _>(io::Error::from(ErrorKind::ConnectionRefused))
        })
        .await;
        assert!(
            matches!(result, Err(ProbeError::Connect(ref e)) if e.kind() == ErrorKind::ConnectionRefused)
        );
    }

    #[cfg(unix)]
    fn seqpacket_listener(path: &std::path::Path, backlog: i32) -> Socket {
        let listener = Socket::new(Domain::UNIX, Type::SEQPACKET, None).unwrap();
        listener.bind(&SockAddr::unix(path).unwrap()).unwrap();
        listener.listen(backlog).unwrap();
        listener
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dial_unix_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.sock:0");
        let _listener = tokio::net::UnixListener::bind(&path).unwrap();

        let conn = dial(
            Protocol::Unix,
            path.to_str().unwrap(),
            &Port::from(0u16),
            far_deadline(),
        )
        .await
        .unwrap();
        assert!(matches!(conn, Connection::Unix(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dial_unix_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sock:1");

        let result = dial(
            Protocol::Unixgram,
            path.to_str().unwrap(),
            &Port::from(1u16),
            far_deadline(),
        )
        .await;
        assert!(matches!(result, Err(ProbeError::Connect(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dial_seqpacket_listener() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packet.sock:1");
        let _listener = seqpacket_listener(&path, 8);

        let conn = dial(
            Protocol::Unixpacket,
            path.to_str().unwrap(),
            &Port::from(1u16),
            far_deadline(),
        )
        .await
        .unwrap();
        assert!(matches!(conn, Connection::SeqPacket(_)));
        conn.close().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dial_seqpacket_full_backlog_returns_promptly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("busy.sock:1");
        // Never accepts, so the backlog fills after the first connect
        let _listener = seqpacket_listener(&path, 0);
        let target = path.to_str().unwrap();

        let mut results = Vec::new();
        for _ in 0..4 {
            let attempt = timeout(
                Duration::from_millis(500),
                dial(Protocol::Unixpacket, target, &Port::from(1u16), far_deadline()),
            )
            .await;
            let result = attempt.expect("seqpacket dial must not wait on a full backlog");
            results.push(result.is_ok());
        }

        assert_eq!(results.last(), Some(&false));
    }
}
