//! Sequential rtpdump capture decoding
//!
//! [`Reader`] wraps any [`AsyncRead`] source and yields one decoded record
//! per call. End of input is only reported between records; a stream that
//! ends inside a record surfaces as [`Error::TruncatedRecord`] rather than
//! a silent short read.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::debug;

use crate::error::Error;
use crate::header::{check_preamble, FileHeader};
use crate::record::{Packet, RecordHeader};
use crate::Result;

// Longest preamble line accepted; real captures carry about 23 bytes
const MAX_PREAMBLE_LEN: u64 = 256;

/// Streaming decoder for rtpdump captures
///
/// Construction consumes and validates the preamble line and the fixed file
/// header; afterwards every [`next`](Reader::next) call advances the stream
/// by exactly one record. Payload bytes are consumed before they are
/// decoded, so a payload decode failure leaves the stream aligned on the
/// following record boundary and iteration may continue.
#[derive(Debug)]
pub struct Reader<R> {
    inner: BufReader<R>,
    header: FileHeader,
}

impl<R: AsyncRead + Unpin> Reader<R> {
    /// Open a capture, consuming its preamble line and file header
    pub async fn new(reader: R) -> Result<Self> {
        let mut inner = BufReader::new(reader);

        let mut line = Vec::new();
        (&mut inner)
            .take(MAX_PREAMBLE_LEN)
            .read_until(b'\n', &mut line)
            .await?;
        check_preamble(&line)?;

        let mut fixed = [0u8; FileHeader::SIZE];
        if let Err(err) = inner.read_exact(&mut fixed).await {
            return Err(match err.kind() {
                io::ErrorKind::UnexpectedEof => Error::TruncatedHeader,
                _ => Error::Io(err),
            });
        }
        let header = FileHeader::parse(&mut &fixed[..])?;
        debug!(
            "Opened rtpdump capture from {}:{}",
            header.source, header.port
        );

        Ok(Self { inner, header })
    }

    /// The capture's global header
    pub fn header(&self) -> FileHeader {
        self.header
    }

    /// Decode the next record
    ///
    /// Returns `Ok(None)` only when the stream ends cleanly on a record
    /// boundary. Once exhausted, further calls keep returning `Ok(None)`.
    pub async fn next(&mut self) -> Result<Option<Packet>> {
        let mut head = [0u8; RecordHeader::SIZE];
        let filled = self.fill(&mut head).await?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < head.len() {
            return Err(Error::TruncatedRecord {
                required: head.len(),
                available: filled,
            });
        }
        let header = RecordHeader::parse(&mut &head[..])?;

        let mut body = vec![0u8; header.stored_len()];
        let filled = self.fill(&mut body).await?;
        if filled < body.len() {
            return Err(Error::TruncatedRecord {
                required: body.len(),
                available: filled,
            });
        }

        Packet::parse(&header, &body).map(Some)
    }

    /// Read until `buf` is full or the stream ends, returning bytes read
    async fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.inner.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}
