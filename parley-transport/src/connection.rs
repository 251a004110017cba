//! Framed TCP connection.
//!
//! One logical message is a NUL-terminated payload inside a fixed
//! 1024-byte receive window (see `parley_core::frame`). The reader
//! accumulates across short reads and retains leftover bytes, so split
//! or coalesced TCP segments never corrupt message boundaries.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use parley_core::{frame, FrameBuffer};

use crate::error::TransportError;

/// A connected chat client socket, before splitting for duplex use.
pub struct Connection {
    reader: ConnectionReader,
    writer: ConnectionWriter,
    peer_addr: String,
}

impl Connection {
    /// Dial the server.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: ConnectionReader {
                inner: read_half,
                frame: FrameBuffer::new(),
            },
            writer: ConnectionWriter { inner: write_half },
            peer_addr,
        })
    }

    /// The remote address, for display.
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Split into independently owned read and write halves.
    pub fn split(self) -> (ConnectionReader, ConnectionWriter) {
        (self.reader, self.writer)
    }
}

/// The receiving half of a connection.
pub struct ConnectionReader {
    inner: OwnedReadHalf,
    frame: FrameBuffer,
}

impl ConnectionReader {
    /// Read the next raw payload (pre-deobfuscation bytes).
    pub async fn read_payload(&mut self) -> Result<Vec<u8>, TransportError> {
        loop {
            if let Some(payload) = self.frame.next_frame()? {
                return Ok(payload);
            }
            let n = self.inner.read(self.frame.writable()).await?;
            if n == 0 {
                return Err(TransportError::ConnectionClosed);
            }
            self.frame.advance(n)?;
        }
    }
}

/// The sending half of a connection.
pub struct ConnectionWriter {
    inner: OwnedWriteHalf,
}

impl ConnectionWriter {
    /// Write one payload as a single frame (one write call).
    pub async fn write_payload(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let wire = frame::encode_frame(payload)?;
        self.inner.write_all(&wire).await?;
        Ok(())
    }

    /// Flush and close the write direction.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}
