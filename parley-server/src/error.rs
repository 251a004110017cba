//! Server-side errors.
//!
//! Every per-connection failure is caught at the session level and
//! converted into teardown, registry cleanup and a departure broadcast.
//! No error crosses a connection boundary.

use parley_core::ProtocolError;

/// Errors that tear down a single connection.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Socket read or write failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing violation on the inbound stream.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,
}
