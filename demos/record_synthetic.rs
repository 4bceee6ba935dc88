//! Synthetic Capture Recording Example
//!
//! Generates one second of PCMU audio as RTP packets, records them to an
//! rtpdump capture file in real time, and closes the session with an RTCP
//! Goodbye. Pass a target path as the first argument, or a `capture.rtpdump`
//! file is written in the current directory.

use bytes::Bytes;
use tokio::time::{sleep, Duration};
use tracing::info;

use rvoip_rtpdump::Writer;

const PACKET_COUNT: u16 = 50;
const PTIME: Duration = Duration::from_millis(20);
const SAMPLES_PER_PACKET: u32 = 160;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "capture.rtpdump".to_string());

    info!("🎙️ Recording {} synthetic PCMU packets to {}", PACKET_COUNT, path);

    let file = tokio::fs::File::create(&path).await?;
    let writer = Writer::new(file);

    let ssrc = 0x5eed_0001;
    for sequence_number in 0..PACKET_COUNT {
        let packet = rtp::packet::Packet {
            header: rtp::header::Header {
                version: 2,
                payload_type: 0, // PCMU
                marker: sequence_number == 0,
                sequence_number,
                timestamp: sequence_number as u32 * SAMPLES_PER_PACKET,
                ssrc,
                ..Default::default()
            },
            // mu-law silence
            payload: Bytes::from(vec![0xff; SAMPLES_PER_PACKET as usize]),
            ..Default::default()
        };

        writer.write_rtp(&packet).await?;
        sleep(PTIME).await;
    }

    // Close the session the way a live sender would
    let bye: Vec<Box<dyn rtcp::packet::Packet + Send + Sync>> =
        vec![Box::new(rtcp::goodbye::Goodbye {
            sources: vec![ssrc],
            reason: Bytes::from_static(b"recording done"),
            ..Default::default()
        })];
    writer.write_rtcp(&bye).await?;

    writer.flush().await?;
    let file = writer.into_inner();
    file.sync_all().await?;

    let size = file.metadata().await?.len();
    info!("✅ Wrote {} records ({} bytes) to {}", PACKET_COUNT + 1, size, path);

    Ok(())
}
