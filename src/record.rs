//! rtpdump record codec
//!
//! After the file header a capture is a flat sequence of records, each an
//! 8-byte sub-header followed by the bytes of one RTP packet or one RTCP
//! compound packet. A zero `payload_length` marks RTCP; that field is the
//! only discriminator the format has.

use std::time::Duration;

use bytes::{Buf, BufMut, BytesMut};
use webrtc_util::marshal::{Marshal, Unmarshal};

use crate::error::Error;
use crate::Result;

/// Fixed sub-header preceding every record's payload bytes
///
/// On the wire, big-endian: u16 total record length (sub-header included),
/// u16 original RTP packet length (zero for RTCP), u32 milliseconds since
/// the capture start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Total record bytes including this sub-header, at least [`Self::SIZE`]
    pub length: u16,

    /// Original RTP packet length, or zero for an RTCP record
    ///
    /// For RTP this may exceed the bytes actually stored when the capture
    /// truncated the packet.
    pub payload_length: u16,

    /// Milliseconds elapsed since the capture start
    pub offset_ms: u32,
}

impl RecordHeader {
    /// Size of the sub-header in bytes
    pub const SIZE: usize = 8;

    /// Parse one sub-header, rejecting lengths that cannot cover it
    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < Self::SIZE {
            return Err(Error::TruncatedRecord {
                required: Self::SIZE,
                available: buf.remaining(),
            });
        }

        let length = buf.get_u16();
        let payload_length = buf.get_u16();
        let offset_ms = buf.get_u32();

        if (length as usize) < Self::SIZE {
            return Err(Error::InvalidRecordLength { length });
        }

        Ok(Self {
            length,
            payload_length,
            offset_ms,
        })
    }

    /// Build the sub-header for a payload about to be written
    pub fn for_payload(payload_len: usize, is_rtcp: bool, offset_ms: u32) -> Result<Self> {
        let length = payload_len + Self::SIZE;
        if length > u16::MAX as usize {
            return Err(Error::OversizedPayload { size: payload_len });
        }

        Ok(Self {
            length: length as u16,
            payload_length: if is_rtcp { 0 } else { payload_len as u16 },
            offset_ms,
        })
    }

    /// Serialize the sub-header into `buf`
    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.reserve(Self::SIZE);
        buf.put_u16(self.length);
        buf.put_u16(self.payload_length);
        buf.put_u32(self.offset_ms);
        Ok(())
    }

    /// Bytes of payload stored in the stream for this record
    pub fn stored_len(&self) -> usize {
        (self.length as usize).saturating_sub(Self::SIZE)
    }

    /// True when this record holds an RTCP compound packet
    pub fn is_rtcp(&self) -> bool {
        self.payload_length == 0
    }
}

/// Payload of one decoded record
///
/// The format cannot represent a record that is both RTP and RTCP, and the
/// enum keeps decoded packets that way.
#[derive(Debug)]
pub enum PacketPayload {
    /// One RTP packet
    Rtp(rtp::packet::Packet),

    /// One RTCP compound packet
    Rtcp(Vec<Box<dyn rtcp::packet::Packet + Send + Sync>>),
}

impl Clone for PacketPayload {
    fn clone(&self) -> Self {
        match self {
            Self::Rtp(packet) => Self::Rtp(packet.clone()),
            Self::Rtcp(packets) => Self::Rtcp(packets.iter().map(|p| p.cloned()).collect()),
        }
    }
}

impl PartialEq for PacketPayload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Rtp(a), Self::Rtp(b)) => a == b,
            (Self::Rtcp(a), Self::Rtcp(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equal(y.as_ref()))
            }
            _ => false,
        }
    }
}

/// One decoded capture record
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Milliseconds since the capture start
    pub offset_ms: u32,

    /// Decoded RTP or RTCP payload
    pub payload: PacketPayload,
}

impl Packet {
    /// Record offset as a [`Duration`] since the capture start
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms as u64)
    }

    /// True when this record holds an RTCP compound packet
    pub fn is_rtcp(&self) -> bool {
        matches!(self.payload, PacketPayload::Rtcp(_))
    }

    /// The RTP packet, if this is an RTP record
    pub fn rtp(&self) -> Option<&rtp::packet::Packet> {
        match &self.payload {
            PacketPayload::Rtp(packet) => Some(packet),
            PacketPayload::Rtcp(_) => None,
        }
    }

    /// The RTCP compound packet, if this is an RTCP record
    pub fn rtcp(&self) -> Option<&[Box<dyn rtcp::packet::Packet + Send + Sync>]> {
        match &self.payload {
            PacketPayload::Rtp(_) => None,
            PacketPayload::Rtcp(packets) => Some(packets),
        }
    }

    /// Decode one record from its sub-header and stored payload bytes
    ///
    /// `body` must hold exactly the record's stored payload. Failures here
    /// are scoped to this record; the caller's stream position is already
    /// past it.
    pub fn parse(header: &RecordHeader, body: &[u8]) -> Result<Self> {
        let payload = if header.is_rtcp() {
            let mut buf = body;
            let packets = rtcp::packet::unmarshal(&mut buf).map_err(Error::RtcpPayload)?;
            PacketPayload::Rtcp(packets)
        } else {
            let mut buf = body;
            let packet = rtp::packet::Packet::unmarshal(&mut buf).map_err(Error::RtpPayload)?;
            PacketPayload::Rtp(packet)
        };

        Ok(Self {
            offset_ms: header.offset_ms,
            payload,
        })
    }

    /// Re-encode this record, sub-header included
    pub fn serialize(&self) -> Result<BytesMut> {
        let payload = match &self.payload {
            PacketPayload::Rtp(packet) => packet.marshal().map_err(Error::RtpPayload)?,
            PacketPayload::Rtcp(packets) => {
                rtcp::packet::marshal(packets).map_err(Error::RtcpPayload)?
            }
        };

        let header = RecordHeader::for_payload(payload.len(), self.is_rtcp(), self.offset_ms)?;
        let mut buf = BytesMut::with_capacity(RecordHeader::SIZE + payload.len());
        header.serialize(&mut buf)?;
        buf.put_slice(&payload);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn sample_rtp(sequence_number: u16) -> rtp::packet::Packet {
        rtp::packet::Packet {
            header: rtp::header::Header {
                version: 2,
                payload_type: 96,
                sequence_number,
                timestamp: sequence_number as u32 * 160,
                ssrc: 0xdeca_fbad,
                ..Default::default()
            },
            payload: Bytes::from_static(&[0x11, 0x22, 0x33, 0x44]),
            ..Default::default()
        }
    }

    fn sample_bye() -> Vec<Box<dyn rtcp::packet::Packet + Send + Sync>> {
        vec![Box::new(rtcp::goodbye::Goodbye {
            sources: vec![0xdeca_fbad],
            reason: Bytes::from_static(b"done"),
            ..Default::default()
        }) as Box<dyn rtcp::packet::Packet + Send + Sync>]
    }

    #[test]
    fn test_record_header_roundtrip() {
        let header = RecordHeader::for_payload(100, false, 1234).unwrap();
        assert_eq!(header.length, 108);
        assert_eq!(header.payload_length, 100);
        assert_eq!(header.stored_len(), 100);
        assert!(!header.is_rtcp());

        let mut buf = BytesMut::new();
        header.serialize(&mut buf).unwrap();
        assert_eq!(buf.len(), RecordHeader::SIZE);

        let parsed = RecordHeader::parse(&mut buf.freeze()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_rtcp_discriminator() {
        let header = RecordHeader::for_payload(64, true, 5).unwrap();
        assert_eq!(header.length, 72);
        assert_eq!(header.payload_length, 0);
        assert_eq!(header.stored_len(), 64);
        assert!(header.is_rtcp());
    }

    #[test]
    fn test_parse_rejects_short_length() {
        // length = 4 cannot even cover the sub-header
        let mut buf: &[u8] = &[0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let err = RecordHeader::parse(&mut buf).unwrap_err();
        assert!(matches!(err, Error::InvalidRecordLength { length: 4 }));
    }

    #[test]
    fn test_parse_short_buffer() {
        let mut buf: &[u8] = &[0x00, 0x10, 0x00];
        let err = RecordHeader::parse(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedRecord {
                required: 8,
                available: 3
            }
        ));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        // Largest payload whose total record length still fits the u16 field
        let limit = u16::MAX as usize - RecordHeader::SIZE;
        let header = RecordHeader::for_payload(limit, false, 0).unwrap();
        assert_eq!(header.length, u16::MAX);
        assert_eq!(header.stored_len(), limit);

        // One byte past the boundary
        let err = RecordHeader::for_payload(limit + 1, false, 0).unwrap_err();
        assert!(matches!(err, Error::OversizedPayload { size: 65528 }));

        let err = RecordHeader::for_payload(u16::MAX as usize, false, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::OversizedPayload {
                size: 65535
            }
        ));
    }

    #[test]
    fn test_rtp_packet_roundtrip() {
        let rtp_packet = sample_rtp(42);
        let wire = rtp_packet.marshal().unwrap();

        let header = RecordHeader::for_payload(wire.len(), false, 250).unwrap();
        let packet = Packet::parse(&header, &wire).unwrap();

        assert!(!packet.is_rtcp());
        assert_eq!(packet.offset(), Duration::from_millis(250));
        let decoded = packet.rtp().unwrap();
        assert_eq!(decoded.header.sequence_number, 42);
        assert_eq!(decoded.header.ssrc, 0xdeca_fbad);
        assert_eq!(decoded.payload, rtp_packet.payload);
        assert!(packet.rtcp().is_none());

        // Re-encoding reproduces the record byte for byte
        let mut head = BytesMut::new();
        header.serialize(&mut head).unwrap();
        let serialized = packet.serialize().unwrap();
        assert_eq!(&serialized[..RecordHeader::SIZE], &head[..]);
        assert_eq!(&serialized[RecordHeader::SIZE..], &wire[..]);
    }

    #[test]
    fn test_rtcp_packet_roundtrip() {
        let compound = sample_bye();
        let wire = rtcp::packet::marshal(&compound).unwrap();

        let header = RecordHeader::for_payload(wire.len(), true, 90).unwrap();
        let packet = Packet::parse(&header, &wire).unwrap();

        assert!(packet.is_rtcp());
        assert!(packet.rtp().is_none());
        let decoded = packet.rtcp().unwrap();
        assert_eq!(decoded.len(), 1);
        let bye = decoded[0]
            .as_any()
            .downcast_ref::<rtcp::goodbye::Goodbye>()
            .unwrap();
        assert_eq!(bye.sources, vec![0xdeca_fbad]);
        assert_eq!(bye.reason, Bytes::from_static(b"done"));

        let serialized = packet.serialize().unwrap();
        assert_eq!(&serialized[RecordHeader::SIZE..], &wire[..]);
    }

    #[test]
    fn test_undecodable_rtp_body() {
        // payload_length > 0 makes this an RTP record, but four bytes cannot
        // hold an RTP header
        let header = RecordHeader::for_payload(4, false, 0).unwrap();
        let err = Packet::parse(&header, &[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, Error::RtpPayload(_)));
        assert!(err.is_payload_error());
    }

    #[test]
    fn test_undecodable_rtcp_body() {
        let header = RecordHeader::for_payload(2, true, 0).unwrap();
        let err = Packet::parse(&header, &[0x00, 0x00]).unwrap_err();
        assert!(matches!(err, Error::RtcpPayload(_)));
        assert!(err.is_payload_error());
    }

    #[test]
    fn test_packet_clone_and_eq() {
        let compound = sample_bye();
        let wire = rtcp::packet::marshal(&compound).unwrap();
        let header = RecordHeader::for_payload(wire.len(), true, 10).unwrap();
        let packet = Packet::parse(&header, &wire).unwrap();

        let cloned = packet.clone();
        assert_eq!(cloned, packet);

        let rtp_wire = sample_rtp(1).marshal().unwrap();
        let rtp_header = RecordHeader::for_payload(rtp_wire.len(), false, 10).unwrap();
        let rtp_record = Packet::parse(&rtp_header, &rtp_wire).unwrap();
        assert_ne!(rtp_record, packet);
    }
}
