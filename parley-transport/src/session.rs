//! Duplex chat client.
//!
//! Two tasks per connection: a receive loop that decodes inbound lines
//! through the obfuscation layer, and a writer that drains a bounded
//! single-slot queue. The queue replaces the legacy ready-to-send flag:
//! same at-most-one-pending-message semantics, no busy-wait.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use parley_core::ObfuscationState;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::TransportError;

/// Inbound event queue depth. Receiving is decoupled from rendering.
const INBOUND_QUEUE_DEPTH: usize = 32;

/// A live chat client over one connection.
///
/// Dropping the client closes the connection: both tasks observe their
/// channel endpoints closing and shut the socket down.
pub struct ChatClient {
    outbound: mpsc::Sender<String>,
    inbound: mpsc::Receiver<String>,
    state: Arc<Mutex<ObfuscationState>>,
}

impl ChatClient {
    /// Connect and start the duplex loops.
    pub async fn connect(config: &ClientConfig) -> Result<Self, TransportError> {
        let connection = Connection::connect(&config.addr()).await?;
        let (mut reader, mut writer) = connection.split();

        let state = Arc::new(Mutex::new(ObfuscationState::new()));

        // Depth 1: at most one outbound message pending; senders block.
        let (out_tx, mut out_rx) = mpsc::channel::<String>(1);
        let (in_tx, in_rx) = mpsc::channel::<String>(INBOUND_QUEUE_DEPTH);

        let read_state = state.clone();
        tokio::spawn(async move {
            while let Ok(mut payload) = reader.read_payload().await {
                read_state.lock().await.apply_inbound(&mut payload);
                // Lossy: obfuscated tails are not guaranteed UTF-8.
                let line = String::from_utf8_lossy(&payload).into_owned();
                if in_tx.send(line).await.is_err() {
                    break;
                }
            }
            // Dropping in_tx signals disconnection to the consumer.
        });

        let write_state = state.clone();
        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                let mut payload = text.into_bytes();
                write_state.lock().await.apply_outbound(&mut payload);
                if writer.write_payload(&payload).await.is_err() {
                    break;
                }
            }
            let _ = writer.shutdown().await;
        });

        Ok(Self {
            outbound: out_tx,
            inbound: in_rx,
            state,
        })
    }

    /// Queue one line for sending. Blocks while a message is pending.
    pub async fn send(&self, line: impl Into<String>) -> Result<(), TransportError> {
        self.outbound
            .send(line.into())
            .await
            .map_err(|_| TransportError::Disconnected)
    }

    /// Next delivered line, already deobfuscated when the mode is on.
    /// `None` means the connection is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Flip the obfuscate-outbound mode; returns the new setting.
    pub async fn toggle_obfuscation(&self) -> bool {
        self.state.lock().await.toggle()
    }

    /// Whether the obfuscate-outbound mode is on.
    pub async fn obfuscation_enabled(&self) -> bool {
        self.state.lock().await.enabled()
    }

    /// Send the next message in the clear, whatever the mode says.
    /// Used for whispers and the explicit no-encrypt command.
    pub async fn skip_encode_once(&self) {
        self.state.lock().await.skip_once();
    }
}
