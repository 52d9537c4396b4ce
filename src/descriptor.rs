//! Connection descriptor codec.
//!
//! The engine addresses peers with an opaque, fixed-length connection
//! descriptor: four IPv4 address octets in network order followed by the
//! UDP port in big-endian byte order (high byte = port / 256, low byte =
//! port % 256). Descriptors have no lifecycle of their own; they are
//! encoded and decoded per message at the engine boundary.

use byteorder::{BigEndian, ByteOrder};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Exact length of a connection descriptor in bytes.
pub const DESCRIPTOR_LEN: usize = 6;

/// A buffer was too short to hold or parse a full descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("malformed connection descriptor: expected 6 bytes, got {actual}")]
pub struct MalformedDescriptor {
    pub actual: usize,
}

/// Encodes an address/port pair as a 6-byte descriptor.
pub fn encode(addr: SocketAddrV4) -> [u8; DESCRIPTOR_LEN] {
    let mut out = [0u8; DESCRIPTOR_LEN];
    out[..4].copy_from_slice(&addr.ip().octets());
    BigEndian::write_u16(&mut out[4..6], addr.port());
    out
}

/// Encodes a descriptor into a caller-supplied buffer.
///
/// The capacity is validated up front; a short buffer fails with no partial
/// write. Returns the number of bytes written (always [`DESCRIPTOR_LEN`]).
pub fn encode_into(addr: SocketAddrV4, out: &mut [u8]) -> Result<usize, MalformedDescriptor> {
    if out.len() < DESCRIPTOR_LEN {
        return Err(MalformedDescriptor { actual: out.len() });
    }
    out[..DESCRIPTOR_LEN].copy_from_slice(&encode(addr));
    Ok(DESCRIPTOR_LEN)
}

/// Decodes a descriptor back into an address/port pair.
///
/// Bytes past the first six are ignored; the engine may hand over a larger
/// fixed-size field. Fewer than six bytes is a hard error.
pub fn decode(bytes: &[u8]) -> Result<SocketAddrV4, MalformedDescriptor> {
    if bytes.len() < DESCRIPTOR_LEN {
        return Err(MalformedDescriptor { actual: bytes.len() });
    }
    let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    let port = BigEndian::read_u16(&bytes[4..6]);
    Ok(SocketAddrV4::new(ip, port))
}
