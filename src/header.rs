//! rtpdump file header codec
//!
//! Every capture begins with an ASCII preamble line followed by a fixed
//! 16-byte binary header. The preamble carries a descriptive `address/port`
//! text that is never authoritative; the binary fields are what round-trip.

use std::net::Ipv4Addr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::Error;
use crate::Result;

/// Prefix every capture must start with, trailing space included
pub const PREAMBLE_PREFIX: &[u8] = b"#!rtpplay1.0 ";

/// Preamble line emitted when writing a capture
///
/// The `0.0.0.0/0` text is fixed; readers take the source address and port
/// from the binary header fields instead.
pub const PREAMBLE: &[u8] = b"#!rtpplay1.0 0.0.0.0/0\n";

/// rtpdump global file header
///
/// Appears exactly once per capture, between the preamble line and the first
/// record. On the wire: u32 start seconds, u32 start microseconds (UNIX
/// epoch, UTC), u32 IPv4 source address, u16 source port, u16 reserved, all
/// big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Wall-clock instant the capture started, microsecond resolution
    pub start: SystemTime,

    /// IPv4 address the packets were captured from, may be unspecified
    pub source: Ipv4Addr,

    /// Source UDP port, may be zero
    pub port: u16,
}

impl FileHeader {
    /// Size of the fixed binary portion in bytes
    pub const SIZE: usize = 16;

    /// Parse the fixed binary portion that follows the preamble line
    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < Self::SIZE {
            return Err(Error::TruncatedHeader);
        }

        let seconds = buf.get_u32();
        let micros = buf.get_u32();
        let source = Ipv4Addr::from(buf.get_u32());
        let port = buf.get_u16();
        // Reserved field, ignored on read
        let _reserved = buf.get_u16();

        Ok(Self {
            start: UNIX_EPOCH + Duration::from_secs(seconds as u64) + Duration::from_micros(micros as u64),
            source,
            port,
        })
    }

    /// Serialize the complete file header: preamble line plus fixed fields
    ///
    /// Sub-microsecond precision of `start` is truncated; times before the
    /// UNIX epoch are clamped to zero.
    pub fn serialize(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(PREAMBLE.len() + Self::SIZE);
        buf.put_slice(PREAMBLE);

        let since_epoch = self
            .start
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0));
        buf.put_u32(since_epoch.as_secs() as u32);
        buf.put_u32(since_epoch.subsec_micros());
        buf.put_u32(u32::from(self.source));
        buf.put_u16(self.port);
        buf.put_u16(0); // reserved

        Ok(buf)
    }
}

/// Validate a complete preamble line, newline included
pub(crate) fn check_preamble(line: &[u8]) -> Result<()> {
    if line.last() != Some(&b'\n') || !line.starts_with(PREAMBLE_PREFIX) {
        return Err(Error::InvalidPreamble);
    }
    Ok(())
}
