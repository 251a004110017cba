//! Message routing: broadcast and whisper semantics.
//!
//! The router persists every routed message (best-effort) and resolves
//! recipients through the registry. It is shared behind an `Arc`, and
//! `broadcast` is callable by out-of-band producers (announcement bots)
//! as well as sessions.

use std::sync::Arc;

use parley_core::ChatMessage;

use crate::registry::Registry;
use crate::store::ChatStore;

/// Routes messages between live sessions and into the store.
pub struct Router {
    registry: Arc<Registry>,
    store: Arc<dyn ChatStore>,
}

impl Router {
    /// Create a router over a registry and a store.
    pub fn new(registry: Arc<Registry>, store: Arc<dyn ChatStore>) -> Self {
        Self { registry, store }
    }

    /// Persist, then deliver to every authenticated session.
    ///
    /// Fan-out is best-effort: a recipient whose socket fails is logged
    /// and skipped, and the rest still receive the message.
    pub async fn broadcast(&self, message: ChatMessage) {
        self.store.insert_message(&message).await;
        let line = message.assemble();
        for name in self.registry.deliver_to_authenticated(&line).await {
            tracing::warn!(recipient = %name, "could not deliver broadcast");
        }
    }

    /// Deliver a private message to its named target.
    ///
    /// Persisted whenever the target is a known account, online or not.
    /// Delivery carries the `whispers` annotation and succeeds only if
    /// the target is live and authenticated; the result is returned so
    /// the sender's session can annotate its echo.
    pub async fn whisper(&self, message: ChatMessage) -> bool {
        if self.store.find_account(&message.target).await {
            self.store.insert_message(&message).await;
        }
        let line = message.clone().with_fix("whispers").assemble();
        let delivered = self.registry.deliver_to(&message.target, &line).await;
        if !delivered {
            tracing::debug!(target = %message.target, "whisper target unreachable");
        }
        delivered
    }
}
