//! rtpdump capture encoding
//!
//! [`Writer`] appends RTP and RTCP packets to any [`AsyncWrite`]
//! destination. The file header is emitted lazily by the first write, which
//! also pins the capture start instant every record offset is measured
//! from.

use std::net::Ipv4Addr;
use std::time::SystemTime;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use webrtc_util::marshal::Marshal;

use crate::error::Error;
use crate::header::FileHeader;
use crate::record::RecordHeader;
use crate::Result;

/// Streaming encoder for rtpdump captures
///
/// All methods take `&self`; one internal lock serializes concurrent
/// producers around header initialization, offset computation and the write
/// itself, so offsets are non-decreasing across tasks.
///
/// The emitted file header always carries the unspecified source
/// `0.0.0.0:0`. A failed write is surfaced immediately and never retried;
/// the destination may then end in a truncated record.
pub struct Writer<W> {
    inner: Mutex<Inner<W>>,
}

struct Inner<W> {
    writer: W,
    start: Option<Instant>,
}

impl<W: AsyncWrite + Unpin> Writer<W> {
    /// Create a writer; nothing is written until the first packet
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(Inner {
                writer,
                start: None,
            }),
        }
    }

    /// Append one RTP packet as a record stamped with the elapsed offset
    pub async fn write_rtp(&self, packet: &rtp::packet::Packet) -> Result<()> {
        let payload = packet.marshal().map_err(Error::RtpPayload)?;
        self.write_record(&payload, false).await
    }

    /// Append one RTCP compound packet
    pub async fn write_rtcp(
        &self,
        packets: &[Box<dyn rtcp::packet::Packet + Send + Sync>],
    ) -> Result<()> {
        let payload = rtcp::packet::marshal(packets).map_err(Error::RtcpPayload)?;
        self.write_record(&payload, true).await
    }

    /// Flush the underlying destination
    pub async fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.writer.flush().await?;
        Ok(())
    }

    /// Consume the writer, returning the destination
    pub fn into_inner(self) -> W {
        self.inner.into_inner().writer
    }

    async fn write_record(&self, payload: &[u8], is_rtcp: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let start = inner.ensure_header().await?;
        let offset_ms = start.elapsed().as_millis().min(u32::MAX as u128) as u32;

        let header = RecordHeader::for_payload(payload.len(), is_rtcp, offset_ms)?;
        let mut buf = BytesMut::with_capacity(RecordHeader::SIZE + payload.len());
        header.serialize(&mut buf)?;
        buf.put_slice(payload);

        inner.writer.write_all(&buf).await?;
        Ok(())
    }
}

impl<W: AsyncWrite + Unpin> Inner<W> {
    /// Emit the file header if this is the first write, returning the
    /// capture start instant record offsets are measured from
    async fn ensure_header(&mut self) -> Result<Instant> {
        if let Some(start) = self.start {
            return Ok(start);
        }

        let header = FileHeader {
            start: SystemTime::now(),
            source: Ipv4Addr::UNSPECIFIED,
            port: 0,
        };
        // Attempted exactly once per writer, even if the write fails
        let start = Instant::now();
        self.start = Some(start);

        let bytes = header.serialize()?;
        self.writer.write_all(&bytes).await?;
        debug!("Wrote rtpdump file header");
        Ok(start)
    }
}
