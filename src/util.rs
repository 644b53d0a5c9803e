//! Internal utilities.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Create and bind a UDP socket.
///
/// Goes through `socket2` so the socket is configured before the bind:
/// address reuse for quick restarts, `IPV6_V6ONLY` on IPv6 sockets so
/// IPv4-mapped addresses never appear as peer addresses, and non-blocking
/// mode ahead of the tokio conversion.
pub(crate) fn bind_udp_socket(addr: SocketAddr) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(true)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into())
}

/// Ephemeral local address in the target's address family.
pub(crate) fn ephemeral_addr_for(target: SocketAddr) -> SocketAddr {
    if target.is_ipv6() {
        "[::]:0".parse().expect("static addr")
    } else {
        "0.0.0.0:0".parse().expect("static addr")
    }
}

/// Lowercase hex rendering for binary octet strings.
pub(crate) fn encode_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
