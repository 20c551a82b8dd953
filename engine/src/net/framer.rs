//! Length-prefixed framing.
//!
//! Every frame is a fixed-width unsigned length header followed by exactly that
//! many payload bytes. Width and byte order are configured with the same
//! `struct`-style format strings the trading client uses (`"!I"` by default).

use bytes::{BufMut, Bytes, BytesMut};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderWidth {
    One,
    Two,
    Four,
    Eight,
}

impl HeaderWidth {
    pub fn bytes(self) -> usize {
        match self {
            HeaderWidth::One => 1,
            HeaderWidth::Two => 2,
            HeaderWidth::Four => 4,
            HeaderWidth::Eight => 8,
        }
    }

    /// Largest payload length the header can carry.
    pub fn max_len(self) -> u64 {
        match self {
            HeaderWidth::One => u8::MAX as u64,
            HeaderWidth::Two => u16::MAX as u64,
            HeaderWidth::Four => u32::MAX as u64,
            HeaderWidth::Eight => u64::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HeaderFormat {
    pub width: HeaderWidth,
    pub order: ByteOrder,
}

impl Default for HeaderFormat {
    fn default() -> Self {
        HeaderFormat {
            width: HeaderWidth::Four,
            order: ByteOrder::Big,
        }
    }
}

impl FromStr for HeaderFormat {
    type Err = EngineError;

    // Accepts an optional byte-order prefix ('!' or '>' big, '<' little,
    // '=' or '@' native) followed by one unsigned type code (B, H, I, L, Q).
    // Without a prefix the header is big-endian.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidHeaderFormat(s.to_string());
        let mut chars = s.trim().chars().peekable();

        let order = match chars.peek() {
            Some('!') | Some('>') => {
                chars.next();
                ByteOrder::Big
            }
            Some('<') => {
                chars.next();
                ByteOrder::Little
            }
            Some('=') | Some('@') => {
                chars.next();
                if cfg!(target_endian = "little") { ByteOrder::Little } else { ByteOrder::Big }
            }
            _ => ByteOrder::Big,
        };

        let width = match chars.next() {
            Some('B') => HeaderWidth::One,
            Some('H') => HeaderWidth::Two,
            Some('I') | Some('L') => HeaderWidth::Four,
            Some('Q') => HeaderWidth::Eight,
            _ => return Err(invalid()),
        };

        if chars.next().is_some() {
            return Err(invalid());
        }
        Ok(HeaderFormat { width, order })
    }
}

impl TryFrom<String> for HeaderFormat {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for HeaderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.order {
            ByteOrder::Big => '!',
            ByteOrder::Little => '<',
        };
        let code = match self.width {
            HeaderWidth::One => 'B',
            HeaderWidth::Two => 'H',
            HeaderWidth::Four => 'I',
            HeaderWidth::Eight => 'Q',
        };
        write!(f, "{}{}", prefix, code)
    }
}

impl HeaderFormat {
    fn put_len(&self, buf: &mut BytesMut, len: u64) {
        match (self.width, self.order) {
            (HeaderWidth::One, _) => buf.put_u8(len as u8),
            (HeaderWidth::Two, ByteOrder::Big) => buf.put_u16(len as u16),
            (HeaderWidth::Two, ByteOrder::Little) => buf.put_u16_le(len as u16),
            (HeaderWidth::Four, ByteOrder::Big) => buf.put_u32(len as u32),
            (HeaderWidth::Four, ByteOrder::Little) => buf.put_u32_le(len as u32),
            (HeaderWidth::Eight, ByteOrder::Big) => buf.put_u64(len),
            (HeaderWidth::Eight, ByteOrder::Little) => buf.put_u64_le(len),
        }
    }

    fn read_len(&self, header: &[u8]) -> u64 {
        let mut raw = [0u8; 8];
        let width = self.width.bytes();
        match self.order {
            ByteOrder::Big => {
                raw[8 - width..].copy_from_slice(&header[..width]);
                u64::from_be_bytes(raw)
            }
            ByteOrder::Little => {
                raw[..width].copy_from_slice(&header[..width]);
                u64::from_le_bytes(raw)
            }
        }
    }
}

/// Encodes and decodes frames for one header format and size limit.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    header: HeaderFormat,
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new(header: HeaderFormat, max_frame_len: usize) -> Self {
        FrameCodec { header, max_frame_len }
    }

    pub fn header(&self) -> HeaderFormat {
        self.header
    }

    /// Largest payload this codec will accept in either direction.
    pub fn max_payload_len(&self) -> usize {
        let by_header = usize::try_from(self.header.width.max_len()).unwrap_or(usize::MAX);
        by_header.min(self.max_frame_len)
    }

    pub fn encode(&self, payload: &[u8]) -> Result<Bytes> {
        let max = self.max_payload_len();
        if payload.len() > max {
            return Err(EngineError::FrameTooLarge { len: payload.len(), max });
        }
        let mut buf = BytesMut::with_capacity(self.header.width.bytes() + payload.len());
        self.header.put_len(&mut buf, payload.len() as u64);
        buf.extend_from_slice(payload);
        Ok(buf.freeze())
    }

    pub fn decode_len(&self, header: &[u8]) -> Result<usize> {
        let width = self.header.width.bytes();
        if header.len() < width {
            return Err(EngineError::ConnectionLost(format!(
                "short header: {} of {} bytes",
                header.len(),
                width
            )));
        }
        let len = self.header.read_len(header);
        let max = self.max_payload_len();
        match usize::try_from(len) {
            Ok(len) if len <= max => Ok(len),
            _ => Err(EngineError::FrameTooLarge {
                len: usize::try_from(len).unwrap_or(usize::MAX),
                max,
            }),
        }
    }

    /// Sends header and body with a single write, then flushes.
    pub async fn write_frame<W>(&self, writer: &mut W, payload: &[u8]) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let frame = self.encode(payload)?;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        trace!(bytes = payload.len(), "Wrote frame");
        Ok(())
    }

    /// Reads exactly one frame.
    ///
    /// Returns `ConnectionClosed` if the peer hung up cleanly between frames and
    /// `ConnectionLost` if it hung up part way through one.
    pub async fn read_frame<R>(&self, reader: &mut R) -> Result<Bytes>
    where
        R: AsyncRead + Unpin,
    {
        let width = self.header.width.bytes();
        let mut header = [0u8; 8];
        let got = read_full(reader, &mut header[..width]).await?;
        if got == 0 {
            return Err(EngineError::ConnectionClosed);
        }
        if got < width {
            return Err(EngineError::ConnectionLost(format!("short header: {} of {} bytes", got, width)));
        }

        let len = self.decode_len(&header[..width])?;
        let mut body = BytesMut::zeroed(len);
        let got = read_full(reader, &mut body).await?;
        if got < len {
            return Err(EngineError::ConnectionLost(format!("short body: {} of {} bytes", got, len)));
        }
        trace!(bytes = len, "Read frame");
        Ok(body.freeze())
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        FrameCodec::new(HeaderFormat::default(), 16 * 1024 * 1024)
    }
}

// Loops over partial reads until `buf` is full or the stream ends; returns the
// number of bytes actually read.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
