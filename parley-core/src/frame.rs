//! Wire framing and bounds checking.
//!
//! Wire format (one logical message):
//! ```text
//! +---------------------------+----------+
//! | PAYLOAD (<= 1023 bytes)   | NUL (1B) |
//! +---------------------------+----------+
//! ```
//!
//! The payload is UTF-8 text, possibly transformed by the obfuscation
//! layer. There is no length prefix; the receiver owns a fixed 1024-byte
//! window and treats the first NUL byte as end-of-message. A window that
//! fills completely without a NUL is malformed and the connection must be
//! torn down.
//!
//! # Framing Invariants
//!
//! - One `encode_frame` = one write call on the caller's socket
//! - The reader accumulates across short reads until a NUL appears;
//!   leftover bytes after the NUL are retained for the next message
//! - Payload + terminator always fit the 1024-byte window

use crate::error::ProtocolError;

/// Fixed receive window size, shared by every peer.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Maximum payload length (terminator must fit the window).
pub const MAX_PAYLOAD_LENGTH: usize = RECV_BUFFER_SIZE - 1;

/// Encode a payload into its wire form (payload + NUL terminator).
///
/// # Errors
///
/// Returns `MessageTooLarge` if the payload exceeds [`MAX_PAYLOAD_LENGTH`].
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PAYLOAD_LENGTH {
        return Err(ProtocolError::MessageTooLarge);
    }
    let mut wire = Vec::with_capacity(payload.len() + 1);
    wire.extend_from_slice(payload);
    wire.push(0);
    Ok(wire)
}

/// Incremental receive window for NUL-delimited messages.
///
/// Callers read socket bytes into [`FrameBuffer::writable`], commit them
/// with [`FrameBuffer::advance`], and drain complete messages with
/// [`FrameBuffer::next_frame`]. Splitting and coalescing of TCP segments
/// is handled here; the caller never sees a partial or merged message.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: [u8; RECV_BUFFER_SIZE],
    filled: usize,
}

impl FrameBuffer {
    /// Create an empty receive window.
    pub fn new() -> Self {
        Self {
            buf: [0u8; RECV_BUFFER_SIZE],
            filled: 0,
        }
    }

    /// The writable remainder of the window.
    ///
    /// Empty only when the window is full; in that case `next_frame`
    /// reports the malformed stream.
    pub fn writable(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..]
    }

    /// Commit `n` bytes previously read into [`FrameBuffer::writable`].
    ///
    /// # Errors
    ///
    /// Returns `BufferOverflow` if `n` exceeds the writable remainder.
    pub fn advance(&mut self, n: usize) -> Result<(), ProtocolError> {
        if self.filled + n > RECV_BUFFER_SIZE {
            return Err(ProtocolError::BufferOverflow);
        }
        self.filled += n;
        Ok(())
    }

    /// Extract the next complete message payload, if one is buffered.
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns `MissingTerminator` when the window is full and no NUL
    /// byte is present; the stream cannot be resynchronized.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        match self.buf[..self.filled].iter().position(|&b| b == 0) {
            Some(end) => {
                let payload = self.buf[..end].to_vec();
                self.buf.copy_within(end + 1..self.filled, 0);
                self.filled -= end + 1;
                Ok(Some(payload))
            }
            None if self.filled == RECV_BUFFER_SIZE => Err(ProtocolError::MissingTerminator),
            None => Ok(None),
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(fb: &mut FrameBuffer, bytes: &[u8]) {
        fb.writable()[..bytes.len()].copy_from_slice(bytes);
        fb.advance(bytes.len()).unwrap();
    }

    #[test]
    fn test_encode_frame_appends_terminator() {
        let wire = encode_frame(b"hello").unwrap();
        assert_eq!(wire, b"hello\0");
    }

    #[test]
    fn test_encode_frame_too_large() {
        let payload = vec![b'a'; MAX_PAYLOAD_LENGTH + 1];
        assert_eq!(encode_frame(&payload), Err(ProtocolError::MessageTooLarge));
    }

    #[test]
    fn test_encode_frame_max_payload_fits_window() {
        let payload = vec![b'a'; MAX_PAYLOAD_LENGTH];
        let wire = encode_frame(&payload).unwrap();
        assert_eq!(wire.len(), RECV_BUFFER_SIZE);
    }

    #[test]
    fn test_single_message() {
        let mut fb = FrameBuffer::new();
        push(&mut fb, b"hello\0");
        assert_eq!(fb.next_frame().unwrap(), Some(b"hello".to_vec()));
        assert_eq!(fb.next_frame().unwrap(), None);
    }

    #[test]
    fn test_split_message() {
        let mut fb = FrameBuffer::new();
        push(&mut fb, b"hel");
        assert_eq!(fb.next_frame().unwrap(), None);
        push(&mut fb, b"lo\0");
        assert_eq!(fb.next_frame().unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn test_coalesced_messages() {
        let mut fb = FrameBuffer::new();
        push(&mut fb, b"one\0two\0");
        assert_eq!(fb.next_frame().unwrap(), Some(b"one".to_vec()));
        assert_eq!(fb.next_frame().unwrap(), Some(b"two".to_vec()));
        assert_eq!(fb.next_frame().unwrap(), None);
    }

    #[test]
    fn test_empty_message() {
        let mut fb = FrameBuffer::new();
        push(&mut fb, b"\0");
        assert_eq!(fb.next_frame().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_full_window_without_terminator() {
        let mut fb = FrameBuffer::new();
        let junk = vec![b'x'; RECV_BUFFER_SIZE];
        push(&mut fb, &junk);
        assert_eq!(fb.next_frame(), Err(ProtocolError::MissingTerminator));
    }

    #[test]
    fn test_advance_overflow() {
        let mut fb = FrameBuffer::new();
        assert_eq!(
            fb.advance(RECV_BUFFER_SIZE + 1),
            Err(ProtocolError::BufferOverflow)
        );
    }

    #[test]
    fn test_roundtrip_through_window() {
        let mut fb = FrameBuffer::new();
        let wire = encode_frame("s\u{e5} h\u{e4}r".as_bytes()).unwrap();
        push(&mut fb, &wire);
        let payload = fb.next_frame().unwrap().unwrap();
        assert_eq!(payload, "s\u{e5} h\u{e4}r".as_bytes());
    }
}
