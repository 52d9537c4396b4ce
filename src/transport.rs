//! UDP transport shim for BACnet/IP datagrams.
//!
//! Owns the process's single UDP endpoint. Payloads are opaque byte buffers
//! to this layer; only the leading BVLC bytes are inspected, and only for
//! logging. Send failures are logged and reported as zero bytes sent rather
//! than propagated, since the engine's own retry policy governs recovery.
//! Receive polls are bounded by a short timeout so the cooperative tick loop
//! is never stalled; an empty poll is a normal outcome.

use log::{debug, info, trace, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::BACNET_IP_PORT;

/// Staging buffer size. BVLC carries a u16 length, but practical BACnet/IP
/// frames stay below the Ethernet MTU; anything larger than this is dropped.
const STAGING_BUFFER_SIZE: usize = 2048;

/// Leading payload bytes shown by the trace-level hex dump.
const HEX_DUMP_LIMIT: usize = 32;

/// Transport endpoint settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Local address to bind.
    pub bind_addr: Ipv4Addr,
    /// Local UDP port. Binding the standard BACnet/IP port by default;
    /// tests bind port 0 for an ephemeral one.
    pub port: u16,
    /// Upper bound on how long a single receive poll may block.
    pub recv_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_addr: Ipv4Addr::UNSPECIFIED,
            port: BACNET_IP_PORT,
            recv_timeout: Duration::from_millis(1),
        }
    }
}

/// The process's single UDP endpoint.
///
/// Exclusively owned for the process lifetime; the socket is released when
/// the shim drops.
pub struct UdpTransport {
    socket: UdpSocket,
    staging: Box<[u8; STAGING_BUFFER_SIZE]>,
}

impl UdpTransport {
    /// Binds the endpoint. A bind failure is fatal to startup.
    pub fn bind(config: &TransportConfig) -> Result<Self> {
        let addr = SocketAddrV4::new(config.bind_addr, config.port);
        let socket = create_socket(addr, config.recv_timeout).map_err(|source| Error::Bind {
            addr: SocketAddr::V4(addr),
            source,
        })?;

        if let Ok(local) = socket.local_addr() {
            info!("UDP endpoint bound to {}", local);
        }

        Ok(Self {
            socket,
            staging: Box::new([0u8; STAGING_BUFFER_SIZE]),
        })
    }

    /// Returns the bound local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Sends one datagram to `destination`.
    ///
    /// With `broadcast` set the destination address is overridden by the
    /// IPv4 limited-broadcast address (the port is kept). Returns the number
    /// of bytes actually sent; any socket failure is logged and reported as
    /// zero, never propagated.
    pub fn send(&self, payload: &[u8], destination: SocketAddrV4, broadcast: bool) -> usize {
        let target = resolve_destination(destination, broadcast);

        log_bvlc("TX", payload);
        trace!(
            "TX {} bytes to {}: {}",
            payload.len(),
            target,
            hex_dump(payload)
        );

        match self.socket.send_to(payload, SocketAddr::V4(target)) {
            Ok(sent) => {
                debug!("sent {} bytes to {}", sent, target);
                sent
            }
            Err(e) => {
                warn!("UDP send to {} failed: {}", target, e);
                0
            }
        }
    }

    /// Polls for one datagram without blocking past the configured timeout.
    ///
    /// Returns the payload length and the source address, or `None` when
    /// nothing is pending (the normal case), the source is not IPv4, or the
    /// datagram would not fit in `buffer`. Oversized datagrams are dropped
    /// rather than truncated, since a truncated frame would corrupt the
    /// engine's message parsing.
    pub fn try_receive(&mut self, buffer: &mut [u8]) -> Option<(usize, SocketAddrV4)> {
        let (len, src) = match self.socket.recv_from(&mut self.staging[..]) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return None;
            }
            Err(e) => {
                warn!("UDP receive failed: {}", e);
                return None;
            }
        };

        let src = match src {
            SocketAddr::V4(v4) => v4,
            SocketAddr::V6(addr) => {
                warn!("dropping datagram from non-IPv4 source {}", addr);
                return None;
            }
        };

        if len > buffer.len() {
            warn!(
                "dropping {} byte datagram from {}: receive buffer holds only {}",
                len,
                src,
                buffer.len()
            );
            return None;
        }

        buffer[..len].copy_from_slice(&self.staging[..len]);

        debug!("received {} bytes from {}", len, src);
        log_bvlc("RX", &buffer[..len]);
        trace!("RX payload: {}", hex_dump(&buffer[..len]));

        Some((len, src))
    }
}

/// Resolves the wire destination: broadcast overrides the address with the
/// limited-broadcast address regardless of what the descriptor encoded.
fn resolve_destination(destination: SocketAddrV4, broadcast: bool) -> SocketAddrV4 {
    if broadcast {
        SocketAddrV4::new(Ipv4Addr::BROADCAST, destination.port())
    } else {
        destination
    }
}

/// Creates the UDP socket with broadcast enabled and the receive timeout set.
fn create_socket(addr: SocketAddrV4, recv_timeout: Duration) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_broadcast(true)?;
    socket.set_read_timeout(Some(recv_timeout))?;
    socket.bind(&socket2::SockAddr::from(addr))?;
    Ok(UdpSocket::from(socket))
}

/// Formats the first [`HEX_DUMP_LIMIT`] payload bytes as hex for logging.
fn hex_dump(payload: &[u8]) -> String {
    let shown = &payload[..payload.len().min(HEX_DUMP_LIMIT)];
    let mut out = String::with_capacity(shown.len() * 3 + 2);
    for byte in shown {
        out.push_str(&format!("{:02X} ", byte));
    }
    if payload.len() > HEX_DUMP_LIMIT {
        out.push_str("..");
    }
    out
}

/// Logs the BVLC type/function bytes. The payload stays otherwise opaque.
fn log_bvlc(direction: &str, payload: &[u8]) {
    if payload.len() >= 2 {
        debug!(
            "{} BVLC type 0x{:02X}, function 0x{:02X}",
            direction, payload[0], payload[1]
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral() -> TransportConfig {
        TransportConfig {
            bind_addr: Ipv4Addr::LOCALHOST,
            port: 0,
            ..Default::default()
        }
    }

    fn local_port(transport: &UdpTransport) -> u16 {
        transport.local_addr().unwrap().port()
    }

    #[test]
    fn broadcast_overrides_unicast_destination() {
        let unicast = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 50), 47808);
        assert_eq!(
            resolve_destination(unicast, true),
            SocketAddrV4::new(Ipv4Addr::BROADCAST, 47808)
        );
        assert_eq!(resolve_destination(unicast, false), unicast);
    }

    #[test]
    fn bind_ephemeral_assigns_port() {
        let transport = UdpTransport::bind(&ephemeral()).unwrap();
        assert_ne!(local_port(&transport), 0);
    }

    #[test]
    fn empty_poll_returns_none() {
        let mut transport = UdpTransport::bind(&ephemeral()).unwrap();
        let mut buffer = [0u8; 64];
        assert!(transport.try_receive(&mut buffer).is_none());
    }

    #[test]
    fn loopback_unicast_round_trip() {
        let sender = UdpTransport::bind(&ephemeral()).unwrap();
        let mut receiver = UdpTransport::bind(&ephemeral()).unwrap();
        let dest = SocketAddrV4::new(Ipv4Addr::LOCALHOST, local_port(&receiver));

        let payload = [0x81u8, 0x0A, 0x00, 0x08, 0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(sender.send(&payload, dest, false), payload.len());

        let mut buffer = [0u8; 64];
        let mut received = None;
        for _ in 0..100 {
            if let Some(r) = receiver.try_receive(&mut buffer) {
                received = Some(r);
                break;
            }
        }

        let (len, src) = received.expect("datagram should arrive on loopback");
        assert_eq!(&buffer[..len], &payload);
        assert_eq!(src.port(), local_port(&sender));
    }

    #[test]
    fn oversized_datagram_is_refused_not_truncated() {
        let sender = UdpTransport::bind(&ephemeral()).unwrap();
        let mut receiver = UdpTransport::bind(&ephemeral()).unwrap();
        let dest = SocketAddrV4::new(Ipv4Addr::LOCALHOST, local_port(&receiver));

        let payload = [0xAB; 64];
        assert_eq!(sender.send(&payload, dest, false), payload.len());

        let mut small = [0u8; 16];
        let mut refused = true;
        for _ in 0..100 {
            if receiver.try_receive(&mut small).is_some() {
                refused = false;
                break;
            }
        }
        assert!(refused, "oversized datagram must be dropped");
        assert_eq!(small, [0u8; 16], "refused receive must not write");
    }

    #[test]
    fn hex_dump_is_bounded() {
        assert_eq!(hex_dump(&[0x81, 0x0B]), "81 0B ");
        let long = [0u8; 100];
        assert!(hex_dump(&long).ends_with(".."));
    }
}
