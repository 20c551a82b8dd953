//! A framed, message-level view of one client stream.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::framer::FrameCodec;
use super::protocol::{decode_message, encode_message};
use crate::error::Result;

pub struct Connection<S> {
    stream: S,
    codec: FrameCodec,
    peer_addr: Option<SocketAddr>,
    frames_received: u64,
    frames_sent: u64,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, codec: FrameCodec, peer_addr: Option<SocketAddr>) -> Self {
        Connection {
            stream,
            codec,
            peer_addr,
            frames_received: 0,
            frames_sent: 0,
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Reads and decodes the next message.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<T> {
        let body = self.codec.read_frame(&mut self.stream).await?;
        self.frames_received += 1;
        debug!(peer = ?self.peer_addr, bytes = body.len(), "Received frame");
        decode_message(&body)
    }

    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let body = encode_message(message)?;
        self.codec.write_frame(&mut self.stream, &body).await?;
        self.frames_sent += 1;
        debug!(peer = ?self.peer_addr, bytes = body.len(), "Sent frame");
        Ok(())
    }
}
