//! Packet delivery seam for playback
//!
//! Playback does not know where packets go; it hands each RTP packet to an
//! [`RtpSink`]. A channel-backed implementation is provided for tests and
//! in-process pipelines; transports implement the trait themselves.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Error;
use crate::Result;

/// Destination for RTP packets replayed from a capture
///
/// Delivery may fail per packet; playback reports the failure and keeps
/// going with the next record.
#[async_trait]
pub trait RtpSink: Send + Sync {
    /// Deliver one RTP packet
    async fn write_rtp(&self, packet: &rtp::packet::Packet) -> Result<()>;
}

#[async_trait]
impl RtpSink for mpsc::Sender<rtp::packet::Packet> {
    async fn write_rtp(&self, packet: &rtp::packet::Packet) -> Result<()> {
        self.send(packet.clone())
            .await
            .map_err(|_| Error::Sink("channel closed".to_string()))
    }
}
