//! Legacy additive obfuscation transform.
//!
//! Chat payloads are "encrypted" by adding 1 to every byte (wrapping) on
//! the way out and subtracting 1 on the way in. The inbound transform only
//! touches the region after the second space of the line, because the
//! server prepends a plaintext `[timestamp] originator: ` header to every
//! delivered message; the first two space-delimited words of a delivered
//! line are the date and time halves of that header.
//!
//! This is NOT cryptography. It exists for wire compatibility with the
//! legacy clients and is applied only at the client boundary; the server
//! relays and stores payload text opaquely.
//!
//! # Exemption heuristic
//!
//! System and announcement lines pass through undecoded. A line is exempt
//! when it contains `"whisper"` anywhere, when its first word is one of
//! the system markers (`welcome`, `Enter`, `Username`), or when its second
//! word contains `Weather`. Lines with fewer than two space-delimited
//! words are never decoded. The heuristic matches on content and can
//! misfire on user text that happens to look like a marker; that is a
//! known protocol quirk, kept for compatibility. It is isolated behind
//! [`is_exempt`] so a message-kind tag can replace it without touching
//! callers.

/// First-word markers for lines that must pass through undecoded.
const EXEMPT_FIRST_WORDS: [&str; 3] = ["welcome", "Enter", "Username"];

/// Substring marking whispered traffic, exempt anywhere in the line.
const WHISPER_MARKER: &str = "whisper";

/// Second-word substring marking weather announcements.
const WEATHER_MARKER: &str = "Weather";

/// Whether an inbound line is exempt from decoding.
///
/// Lines with fewer than two space-delimited words are always exempt.
pub fn is_exempt(text: &str) -> bool {
    let mut words = text.split(' ');
    let (Some(first), Some(second)) = (words.next(), words.next()) else {
        return true;
    };
    text.contains(WHISPER_MARKER)
        || EXEMPT_FIRST_WORDS.contains(&first)
        || second.contains(WEATHER_MARKER)
}

/// Apply the outbound transform: add 1 to every byte, wrapping at 255.
pub fn encode_payload(payload: &mut [u8]) {
    for b in payload.iter_mut() {
        *b = b.wrapping_add(1);
    }
}

/// Apply the inbound transform to a delivered line.
///
/// Subtracts 1 from every byte after the second space, unless the line is
/// exempt. A line without a second space is decoded from the start (the
/// legacy index arithmetic). Bytes already at 0 are left alone rather
/// than underflowing, which makes the transform lossy at that boundary.
pub fn decode_payload(payload: &mut [u8]) {
    let exempt = {
        let text = String::from_utf8_lossy(payload);
        is_exempt(&text)
    };
    if exempt {
        return;
    }
    let start = second_space(payload).map_or(0, |i| i + 1);
    for b in payload[start..].iter_mut() {
        if *b > 0 {
            *b -= 1;
        }
    }
}

/// Byte index of the second space, if any.
///
/// Safe to compute on raw bytes: 0x20 never occurs inside a multi-byte
/// UTF-8 sequence.
fn second_space(bytes: &[u8]) -> Option<usize> {
    let first = bytes.iter().position(|&b| b == b' ')?;
    bytes[first + 1..]
        .iter()
        .position(|&b| b == b' ')
        .map(|i| first + 1 + i)
}

/// Per-connection obfuscation state.
///
/// `enabled` is the connection's obfuscate-outbound mode; `skip_next`
/// suppresses encoding for exactly one send and then clears. Both are
/// connection-local and never shared across sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObfuscationState {
    enabled: bool,
    skip_next: bool,
}

impl ObfuscationState {
    /// Create a new state with obfuscation disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the obfuscate-outbound mode is on.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Flip the obfuscate-outbound mode; returns the new setting.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Suppress encoding for the next outbound message only.
    pub fn skip_once(&mut self) {
        self.skip_next = true;
    }

    /// Transform one outbound payload in place.
    ///
    /// Consumes the one-shot skip flag if set. Returns whether the
    /// payload was encoded.
    pub fn apply_outbound(&mut self, payload: &mut [u8]) -> bool {
        if self.skip_next {
            self.skip_next = false;
            return false;
        }
        if !self.enabled {
            return false;
        }
        encode_payload(payload);
        true
    }

    /// Transform one inbound line in place, when the mode is on.
    pub fn apply_inbound(&self, payload: &mut [u8]) {
        if self.enabled {
            decode_payload(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_adds_one() {
        let mut payload = b"abc".to_vec();
        encode_payload(&mut payload);
        assert_eq!(payload, b"bcd");
    }

    #[test]
    fn test_encode_wraps_at_255() {
        let mut payload = vec![0xFF];
        encode_payload(&mut payload);
        assert_eq!(payload, vec![0x00]);
    }

    #[test]
    fn test_decode_region_after_second_space() {
        // Delivered lines carry a plaintext "[date time]" prefix; only the
        // tail after the second space was encoded by the sender.
        let mut tail = b"alice: hello".to_vec();
        encode_payload(&mut tail);

        let mut line = b"[2026-08-07 10:00:00] ".to_vec();
        line.extend_from_slice(&tail);
        decode_payload(&mut line);
        assert_eq!(line, b"[2026-08-07 10:00:00] alice: hello");
    }

    #[test]
    fn test_decode_without_second_space_starts_at_zero() {
        // Exactly two words: no second space, so the legacy index
        // arithmetic decodes from the start of the line.
        let mut payload = b"cc dd".to_vec();
        decode_payload(&mut payload);
        assert_eq!(payload, b"bb\x1fcc");
    }

    #[test]
    fn test_decode_single_word_untouched() {
        let mut payload = b"ifmmp".to_vec();
        decode_payload(&mut payload);
        assert_eq!(payload, b"ifmmp");
    }

    #[test]
    fn test_decode_clamps_at_zero() {
        // A zero byte in the decode region is skipped, not underflowed.
        // This makes encode/decode lossy at the boundary; accepted.
        let mut line = b"aa bb \x00\x01".to_vec();
        decode_payload(&mut line);
        assert_eq!(line, b"aa bb \x00\x00");
    }

    #[test]
    fn test_welcome_line_is_exempt() {
        let mut line = b"welcome X".to_vec();
        let before = line.clone();
        decode_payload(&mut line);
        assert_eq!(line, before);
    }

    #[test]
    fn test_exemption_markers() {
        assert!(is_exempt("welcome to the chat"));
        assert!(is_exempt("Enter username: please"));
        assert!(is_exempt("Username taken already"));
        assert!(is_exempt("bob whispers: hi"));
        assert!(is_exempt("from Weather-announcer today"));
        assert!(is_exempt("oneword"));
        assert!(!is_exempt("[2026-08-07 10:00:00] alice: hi"));
    }

    #[test]
    fn test_state_toggle_and_skip() {
        let mut state = ObfuscationState::new();
        assert!(!state.enabled());
        assert!(state.toggle());

        let mut first = b"hi there".to_vec();
        state.skip_once();
        assert!(!state.apply_outbound(&mut first));
        assert_eq!(first, b"hi there");

        // Skip flag cleared after exactly one send.
        let mut second = b"hi there".to_vec();
        assert!(state.apply_outbound(&mut second));
        assert_eq!(second, b"ij!uifsf");
    }

    #[test]
    fn test_inbound_noop_when_disabled() {
        let state = ObfuscationState::new();
        let mut line = b"[2026-08-07 10:00:00] bmjdf; ifmmp".to_vec();
        let before = line.clone();
        state.apply_inbound(&mut line);
        assert_eq!(line, before);
    }
}
