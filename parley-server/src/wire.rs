//! Socket-facing helpers for the framed wire format.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use parley_core::frame;

use crate::error::ServerError;

/// Shared handle to a connection's write half.
///
/// Cloned into the registry so any session's task can deliver to it; the
/// inner mutex keeps concurrent writes from interleaving mid-frame.
pub type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Write one assembled line as a single frame.
pub async fn write_line(writer: &SharedWriter, line: &str) -> Result<(), ServerError> {
    let wire = frame::encode_frame(line.as_bytes())?;
    let mut guard = writer.lock().await;
    guard.write_all(&wire).await?;
    Ok(())
}
