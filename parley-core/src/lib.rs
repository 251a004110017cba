//! Parley Protocol Core
//!
//! Pure protocol library for the Parley chat system.
//!
//! This crate provides:
//! - Wire framing with strict bounds checking (fixed 1024-byte window,
//!   NUL-terminated messages)
//! - The legacy additive obfuscation transform and its exemption heuristic
//! - Message assembly (timestamp, originator, annotation, content)
//! - Command classification and credential syntax validation
//!
//! # Invariants
//!
//! - No I/O happens in this crate; callers own their sockets
//! - A frame never exceeds the 1024-byte receive window
//! - The obfuscation transform is not cryptography and is never treated
//!   as confidentiality
//! - Direct use of `unsafe` is forbidden (#![forbid(unsafe_code)])

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod cipher;
pub mod command;
pub mod error;
pub mod frame;
pub mod message;

pub use cipher::ObfuscationState;
pub use command::Command;
pub use error::ProtocolError;
pub use frame::FrameBuffer;
pub use message::ChatMessage;
