//! Protocol errors.
//!
//! Framing errors are terminal for the connection that produced them.
//! The session owning the connection tears down; there is no resync.

/// All possible protocol errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Payload exceeds the wire limit (1023 bytes + terminator).
    #[error("message too large")]
    MessageTooLarge,

    /// Receive window filled without a NUL terminator.
    #[error("missing terminator")]
    MissingTerminator,

    /// More bytes pushed than the receive window can hold.
    #[error("buffer overflow")]
    BufferOverflow,
}
