//! Error handling for rtpdump capture processing
//!
//! Reading, writing and replaying captures share one error type so that
//! callers can route every failure through a single `Result` alias. Variants
//! distinguish failures that poison the whole stream (preamble, truncation,
//! I/O) from failures scoped to a single record's payload bytes.

use thiserror::Error;

/// Result type for rtpdump operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading, writing or replaying rtpdump captures
#[derive(Error, Debug)]
pub enum Error {
    /// Stream does not begin with the `#!rtpplay1.0 ` preamble line
    #[error("Invalid rtpdump preamble")]
    InvalidPreamble,

    /// Stream ended inside the fixed file header
    #[error("Truncated rtpdump file header")]
    TruncatedHeader,

    /// Record declared a total length smaller than its own 8-byte sub-header
    #[error("Invalid record length {length} (minimum 8)")]
    InvalidRecordLength { length: u16 },

    /// Stream ended before a record's declared bytes were all available
    #[error("Truncated record: required {required} bytes, only {available} available")]
    TruncatedRecord { required: usize, available: usize },

    /// Payload cannot be represented in the 16-bit record length field
    #[error("Payload of {size} bytes does not fit a 16-bit record length")]
    OversizedPayload { size: usize },

    /// RTP packet bytes could not be encoded or decoded
    #[error("RTP payload error: {0}")]
    RtpPayload(webrtc_util::Error),

    /// RTCP compound packet bytes could not be encoded or decoded
    #[error("RTCP payload error: {0}")]
    RtcpPayload(rtcp::Error),

    /// Packet sink refused delivery during playback
    #[error("Sink delivery failed: {0}")]
    Sink(String),

    /// Underlying I/O failure, surfaced immediately and never retried
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures confined to one record's payload bytes.
    ///
    /// The reader consumes a record's payload in full before decoding it, so
    /// after one of these the stream is still aligned on the next record
    /// boundary and iteration may continue. Every other variant means the
    /// stream position can no longer be trusted.
    pub fn is_payload_error(&self) -> bool {
        matches!(self, Self::RtpPayload(_) | Self::RtcpPayload(_))
    }
}
