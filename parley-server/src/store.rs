//! Durable store interface and the in-memory implementation.
//!
//! The server treats the store as an opaque synchronous dependency:
//! account lookup, credential verification, account creation, message
//! insertion and per-recipient history. Persistence is best-effort; a
//! store failure never aborts an in-progress broadcast or whisper, so
//! implementations log failures instead of surfacing them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use sha2::{Digest, Sha256};

use parley_core::message::{ChatMessage, BROADCAST_TARGET};

/// A message row as recorded by the store.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// Originator display name (or system persona).
    pub sender: String,
    /// Message text as routed.
    pub content: String,
    /// Recipient display name, or the broadcast sentinel.
    pub target: String,
    /// Server-side timestamp at routing time.
    pub time: NaiveDateTime,
}

/// The store operations the chat core depends on.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Whether an account with this name exists.
    async fn find_account(&self, name: &str) -> bool;

    /// Whether this name/password pair matches a stored account.
    async fn verify_credentials(&self, name: &str, password: &str) -> bool;

    /// Create an account. Returns false if the name is already taken
    /// or the store rejected the insert.
    async fn create_account(&self, name: &str, password: &str) -> bool;

    /// Record a routed message.
    async fn insert_message(&self, message: &ChatMessage);

    /// Today's messages addressed to this name or broadcast to everyone,
    /// in time order.
    async fn history_for_recipient(&self, name: &str) -> Vec<StoredMessage>;
}

/// In-memory store: accounts plus an append-only message log.
///
/// Passwords are kept as SHA-256 digests; plaintext never rests here.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

struct MemoryStoreInner {
    /// name -> hex SHA-256 password digest
    accounts: HashMap<String, String>,
    messages: Vec<StoredMessage>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStoreInner {
                accounts: HashMap::new(),
                messages: Vec::new(),
            })),
        }
    }

    /// Number of recorded messages. Useful in tests.
    pub fn message_count(&self) -> usize {
        self.inner.lock().expect("MemoryStore mutex poisoned").messages.len()
    }

    fn digest(password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn find_account(&self, name: &str) -> bool {
        self.inner
            .lock()
            .expect("MemoryStore mutex poisoned")
            .accounts
            .contains_key(name)
    }

    async fn verify_credentials(&self, name: &str, password: &str) -> bool {
        self.inner
            .lock()
            .expect("MemoryStore mutex poisoned")
            .accounts
            .get(name)
            .is_some_and(|stored| *stored == Self::digest(password))
    }

    async fn create_account(&self, name: &str, password: &str) -> bool {
        let mut inner = self.inner.lock().expect("MemoryStore mutex poisoned");
        if inner.accounts.contains_key(name) {
            return false;
        }
        inner.accounts.insert(name.to_string(), Self::digest(password));
        true
    }

    async fn insert_message(&self, message: &ChatMessage) {
        let mut inner = self.inner.lock().expect("MemoryStore mutex poisoned");
        inner.messages.push(StoredMessage {
            sender: message.originator.clone(),
            content: message.content.clone(),
            target: message.target.clone(),
            time: message.time,
        });
    }

    async fn history_for_recipient(&self, name: &str) -> Vec<StoredMessage> {
        let today = Local::now().date_naive();
        let inner = self.inner.lock().expect("MemoryStore mutex poisoned");
        let mut rows: Vec<StoredMessage> = inner
            .messages
            .iter()
            .filter(|m| m.time.date() == today && (m.target == name || m.target == BROADCAST_TARGET))
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.time);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_account_lifecycle() {
        let store = MemoryStore::new();
        assert!(!store.find_account("alice").await);
        assert!(store.create_account("alice", "pass1").await);
        assert!(store.find_account("alice").await);

        // Duplicate creation is rejected.
        assert!(!store.create_account("alice", "other2").await);

        assert!(store.verify_credentials("alice", "pass1").await);
        assert!(!store.verify_credentials("alice", "wrong1").await);
        assert!(!store.verify_credentials("bob", "pass1").await);
    }

    #[tokio::test]
    async fn test_history_filters_by_recipient() {
        let store = MemoryStore::new();
        store
            .insert_message(&ChatMessage::broadcast("hello all", "alice"))
            .await;
        store
            .insert_message(&ChatMessage::to("psst", "alice", "bob"))
            .await;
        store
            .insert_message(&ChatMessage::to("secret", "alice", "carol"))
            .await;

        let history = store.history_for_recipient("bob").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hello all");
        assert_eq!(history[1].content, "psst");
        assert_eq!(history[1].target, "bob");
    }
}
