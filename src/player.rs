//! Timing-accurate capture playback
//!
//! [`Player`] reads a capture and re-delivers its RTP packets to an
//! [`RtpSink`] at the offsets they were recorded at, reproducing the
//! original pacing. RTCP records advance the clock but are not delivered;
//! the sink takes RTP only.

use parking_lot::Mutex;
use tokio::io::AsyncRead;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::reader::Reader;
use crate::record::PacketPayload;
use crate::sink::RtpSink;
use crate::Result;

/// Replays a capture in real time
///
/// [`start`](Player::start) runs the playback loop on the calling task and
/// returns when the capture ends or the player is stopped.
/// [`stop`](Player::stop) may be called from any task: it takes effect at
/// the latest at the current packet-wait, never only at end of file, and
/// returns once the loop has confirmed its exit. Stopping an idle player is
/// a no-op that returns immediately.
pub struct Player<R, S> {
    reader: AsyncMutex<Reader<R>>,
    sink: S,
    state: Mutex<PlaybackState>,
    running: watch::Sender<bool>,
}

struct PlaybackState {
    started_at: Option<Instant>,
    cancel: CancellationToken,
}

impl<R, S> Player<R, S>
where
    R: AsyncRead + Unpin,
    S: RtpSink,
{
    /// Open a capture for playback, validating its preamble and header
    pub async fn new(input: R, sink: S) -> Result<Self> {
        let reader = Reader::new(input).await?;
        let (running, _) = watch::channel(false);
        Ok(Self {
            reader: AsyncMutex::new(reader),
            sink,
            state: Mutex::new(PlaybackState {
                started_at: None,
                cancel: CancellationToken::new(),
            }),
            running,
        })
    }

    /// Whether a playback loop is currently running
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Play the capture, returning when it ends or the player is stopped
    ///
    /// Offsets are measured against the instant this call begins; a packet
    /// whose offset has already passed is delivered without waiting. Calling
    /// `start` while playback is already running is a no-op.
    pub async fn start(&self) {
        let (playback_start, cancel) = {
            let mut state = self.state.lock();
            if state.started_at.is_some() {
                return;
            }
            let now = Instant::now();
            state.started_at = Some(now);
            state.cancel = CancellationToken::new();
            self.running.send_replace(true);
            (now, state.cancel.clone())
        };
        debug!("Playback started");

        self.run(playback_start, &cancel).await;

        {
            let mut state = self.state.lock();
            state.started_at = None;
            self.running.send_replace(false);
        }
        debug!("Playback finished");
    }

    /// Stop a running playback and wait for its loop to exit
    ///
    /// Returns immediately when nothing is running.
    pub async fn stop(&self) {
        let mut rx = self.running.subscribe();
        {
            let state = self.state.lock();
            if state.started_at.is_none() {
                return;
            }
            state.cancel.cancel();
        }
        // The loop flips the flag back once it has wound down
        let _ = rx.wait_for(|running| !running).await;
    }

    async fn run(&self, playback_start: Instant, cancel: &CancellationToken) {
        let mut reader = self.reader.lock().await;
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let packet = match reader.next().await {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(err) if err.is_payload_error() => {
                    // The reader is already past the bad record
                    warn!("Skipping undecodable record: {}", err);
                    continue;
                }
                Err(err) => {
                    error!("Playback aborted, capture stream unusable: {}", err);
                    break;
                }
            };

            let deadline = playback_start + packet.offset();
            if Instant::now() < deadline {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = sleep_until(deadline) => {}
                }
            }

            match &packet.payload {
                // RTCP records pace the loop but have no delivery path
                PacketPayload::Rtcp(_) => {}
                PacketPayload::Rtp(rtp_packet) => {
                    if let Err(err) = self.sink.write_rtp(rtp_packet).await {
                        warn!("Sink rejected packet at {}ms: {}", packet.offset_ms, err);
                    }
                }
            }
        }
    }
}
