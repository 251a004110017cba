//! Chat message assembly.
//!
//! A message carries its content, originator, target and timestamp, plus
//! an optional annotation ("fix") such as `whispers` or `(offline)`. The
//! assembled wire form is one line:
//!
//! ```text
//! [2026-08-07 18:30:00] alice whispers: see you at eight
//! ```

use chrono::{Local, NaiveDateTime};

/// Target sentinel meaning "every authenticated session".
pub const BROADCAST_TARGET: &str = "all";

/// Timestamp format used in assembled lines.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One chat message, addressed to a named session or to everyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Message text as typed (possibly obfuscated by the sender).
    pub content: String,
    /// Display name of the sender, or a system persona.
    pub originator: String,
    /// Display name of the recipient, or [`BROADCAST_TARGET`].
    pub target: String,
    /// Optional annotation inserted after the originator.
    fix: Option<String>,
    /// Server-side timestamp.
    pub time: NaiveDateTime,
}

impl ChatMessage {
    /// A message addressed to everyone, stamped with the current time.
    pub fn broadcast(content: impl Into<String>, originator: impl Into<String>) -> Self {
        Self::to(content, originator, BROADCAST_TARGET)
    }

    /// A message addressed to a named session, stamped with the current time.
    pub fn to(
        content: impl Into<String>,
        originator: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::at(content, originator, target, Local::now().naive_local())
    }

    /// A message with a known timestamp (history replay).
    pub fn at(
        content: impl Into<String>,
        originator: impl Into<String>,
        target: impl Into<String>,
        time: NaiveDateTime,
    ) -> Self {
        Self {
            content: content.into(),
            originator: originator.into(),
            target: target.into(),
            fix: None,
            time,
        }
    }

    /// Attach an annotation, rendered as ` {fix}` after the originator.
    pub fn add_fix(&mut self, fix: &str) {
        self.fix = Some(format!(" {fix}"));
    }

    /// Builder form of [`ChatMessage::add_fix`].
    pub fn with_fix(mut self, fix: &str) -> Self {
        self.add_fix(fix);
        self
    }

    /// Whether this message is addressed to everyone.
    pub fn is_broadcast(&self) -> bool {
        self.target == BROADCAST_TARGET
    }

    /// Assemble the delivered line: `[time] originator fix: content`.
    pub fn assemble(&self) -> String {
        format!(
            "[{}] {}{}: {}",
            self.time.format(TIME_FORMAT),
            self.originator,
            self.fix.as_deref().unwrap_or(""),
            self.content,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 7)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_assemble_broadcast() {
        let msg = ChatMessage::at("hello everyone", "alice", BROADCAST_TARGET, noon());
        assert_eq!(msg.assemble(), "[2026-08-07 12:00:00] alice: hello everyone");
        assert!(msg.is_broadcast());
    }

    #[test]
    fn test_assemble_with_fix() {
        let msg = ChatMessage::at("meet me", "alice", "bob", noon()).with_fix("whispers");
        assert_eq!(msg.assemble(), "[2026-08-07 12:00:00] alice whispers: meet me");
        assert!(!msg.is_broadcast());
    }

    #[test]
    fn test_offline_echo_fix() {
        let msg = ChatMessage::at("you there?", "To bob", BROADCAST_TARGET, noon())
            .with_fix("(offline)");
        assert_eq!(
            msg.assemble(),
            "[2026-08-07 12:00:00] To bob (offline): you there?"
        );
    }
}
