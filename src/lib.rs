//! # rvoip-rtpdump - RTPDump capture files for rvoip
//!
//! Reading, writing and timing-accurate replay of media captures in the
//! RTPDump binary format used by the classic rtptools suite (`rtpdump`,
//! `rtpplay`). Captures record RTP and RTCP traffic with millisecond
//! offsets so a session can be replayed later with its original pacing,
//! or synthesized programmatically for tests.
//!
//! ## File format
//!
//! A capture is an ASCII preamble line, a fixed binary header, then a flat
//! sequence of records, all multi-byte fields big-endian:
//!
//! ```text
//! #!rtpplay1.0 address/port\n            preamble (text is descriptive only)
//! u32 start_sec | u32 start_usec         capture start, UNIX epoch UTC
//! u32 source    | u16 port | u16 zero    original packet source
//! repeated records:
//!   u16 length          total record bytes, sub-header included
//!   u16 payload_length  original RTP packet length, 0 marks RTCP
//!   u32 offset_ms       milliseconds since capture start
//!   ...                 RTP packet or RTCP compound packet bytes
//! ```
//!
//! ## Quick start
//!
//! Replay a capture into a channel:
//!
//! ```no_run
//! use rvoip_rtpdump::Player;
//! use tokio::fs::File;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = File::open("session.rtpdump").await?;
//!     let (tx, mut rx) = mpsc::channel(64);
//!
//!     let player = Player::new(file, tx).await?;
//!     tokio::spawn(async move {
//!         while let Some(packet) = rx.recv().await {
//!             println!("rtp seq={}", packet.header.sequence_number);
//!         }
//!     });
//!
//!     // Blocks this task until the capture has fully replayed
//!     player.start().await;
//!     Ok(())
//! }
//! ```
//!
//! The codec types ([`FileHeader`], [`RecordHeader`], [`Packet`]) are
//! public, so tools that rewrite or inspect captures can work a record at
//! a time without going through [`Reader`]/[`Writer`].

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod header;
pub mod player;
pub mod reader;
pub mod record;
pub mod sink;
pub mod writer;

pub use error::{Error, Result};
pub use header::FileHeader;
pub use player::Player;
pub use reader::Reader;
pub use record::{Packet, PacketPayload, RecordHeader};
pub use sink::RtpSink;
pub use writer::Writer;

// The payload codec crates are part of this crate's API surface
pub use rtcp;
pub use rtp;
