//! Transport errors.

use parley_core::ProtocolError;

/// Errors that can occur during client transport operations.
///
/// All of them are terminal for the connection; the caller reconnects by
/// building a new client.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to establish the TCP connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Socket read or write failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing violation on the inbound stream.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// The client's own tasks have shut down.
    #[error("client disconnected")]
    Disconnected,
}
