//! Command classification and credential syntax rules.
//!
//! Classification is purely textual, over the first two
//! whitespace-delimited tokens of a raw input line. There is no escaping
//! for literal leading slashes; a line that does not match a command is a
//! broadcast of the whole line.

/// A classified chat-loop input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Send the whole line to every authenticated session.
    Broadcast(&'a str),
    /// Send to one named session. `content` is everything after the
    /// second space; `None` when the line stops at the target.
    Whisper {
        /// The token after `/w`.
        target: &'a str,
        /// The remainder after the target, if any.
        content: Option<&'a str>,
    },
    /// Leave the chat.
    Quit,
}

/// Classify one raw input line.
///
/// `/w <target> <text>` whispers (only when a space follows `/w`);
/// `/q`, `/quit` and `/disconnect` quit; anything else broadcasts.
pub fn classify(input: &str) -> Command<'_> {
    if let Some((key, rest)) = input.split_once(' ') {
        if key == "/w" {
            return match rest.split_once(' ') {
                Some((target, content)) => Command::Whisper {
                    target,
                    content: Some(content),
                },
                None => Command::Whisper {
                    target: rest,
                    content: None,
                },
            };
        }
        if is_quit(key) {
            return Command::Quit;
        }
    } else if is_quit(input) {
        return Command::Quit;
    }
    Command::Broadcast(input)
}

fn is_quit(key: &str) -> bool {
    matches!(key, "/q" | "/quit" | "/disconnect")
}

/// Whether a candidate display name is syntactically valid:
/// 4 to 45 characters, ASCII letters and digits only.
pub fn valid_name(name: &str) -> bool {
    (4..=45).contains(&name.len()) && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Whether a candidate password is syntactically valid:
/// 4 to 8 characters with at least one decimal digit.
pub fn valid_password(password: &str) -> bool {
    (4..=8).contains(&password.chars().count()) && password.chars().any(|c| c.is_ascii_digit())
}
