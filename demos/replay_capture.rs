//! Capture Replay Example
//!
//! Plays an rtpdump capture file back on its original timeline, delivering
//! the RTP packets into an mpsc channel the way a live pipeline would
//! receive them. Pass the capture path as the first argument, or
//! `capture.rtpdump` from the current directory is used. Record one first
//! with the `record_synthetic` example.

use std::time::UNIX_EPOCH;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::info;

use rvoip_rtpdump::{Player, Reader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "capture.rtpdump".to_string());

    // Peek at the capture metadata before playing it
    let reader = Reader::new(tokio::fs::File::open(&path).await?).await?;
    let header = reader.header();
    let started = header
        .start
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    info!(
        "📼 Capture from {}:{}, recorded at UNIX time {}.{:06}",
        header.source,
        header.port,
        started.as_secs(),
        started.subsec_micros()
    );
    drop(reader);

    let (tx, mut rx) = mpsc::channel::<rtp::packet::Packet>(32);
    let consumer = tokio::spawn(async move {
        let mut count = 0u32;
        while let Some(packet) = rx.recv().await {
            info!(
                "📦 RTP seq={} ts={} payload={} bytes",
                packet.header.sequence_number,
                packet.header.timestamp,
                packet.payload.len()
            );
            count += 1;
        }
        count
    });

    let player = Player::new(tokio::fs::File::open(&path).await?, tx).await?;

    info!("▶️ Replaying {} on its recorded timeline", path);
    let playback_start = Instant::now();
    player.start().await;
    let elapsed = playback_start.elapsed();

    // Dropping the player closes the channel and lets the consumer finish
    drop(player);
    let count = consumer.await?;

    info!("✅ Delivered {} RTP packets in {:.2?}", count, elapsed);

    Ok(())
}
