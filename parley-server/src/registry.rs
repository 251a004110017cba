//! Shared directory of live connections.
//!
//! The registry maps identity (transient numeric id, later the display
//! name) to the connection's delivery handle. It is the only structure
//! mutated from every session task, so insert, remove, rename, lookup
//! and broadcast iteration all run under one mutex. Holding the lock for
//! the whole broadcast fan-out also serializes concurrent broadcasts, so
//! no reader can observe a half-renamed key.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::wire::{self, SharedWriter};

/// Rename failures during authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActivateError {
    /// The requested display name is already live.
    #[error("name already in use")]
    NameTaken,

    /// The transient identity is no longer registered.
    #[error("session no longer registered")]
    SessionGone,
}

struct RegistryEntry {
    authenticated: bool,
    writer: SharedWriter,
}

/// The identity -> connection directory.
pub struct Registry {
    inner: Mutex<HashMap<String, RegistryEntry>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register a freshly accepted, unauthenticated connection.
    pub async fn insert(&self, identity: &str, writer: SharedWriter) {
        let mut inner = self.inner.lock().await;
        inner.insert(
            identity.to_string(),
            RegistryEntry {
                authenticated: false,
                writer,
            },
        );
    }

    /// Remove an identity. Returns whether it was present.
    pub async fn remove(&self, identity: &str) -> bool {
        self.inner.lock().await.remove(identity).is_some()
    }

    /// Atomically replace a transient identity with a display name and
    /// mark the session authenticated.
    ///
    /// The availability check and the rename happen in one critical
    /// section: with concurrent attempts on the same name, exactly one
    /// wins and the rest see [`ActivateError::NameTaken`].
    pub async fn activate(&self, old_identity: &str, name: &str) -> Result<(), ActivateError> {
        let mut inner = self.inner.lock().await;
        if inner.contains_key(name) {
            return Err(ActivateError::NameTaken);
        }
        let mut entry = inner.remove(old_identity).ok_or(ActivateError::SessionGone)?;
        entry.authenticated = true;
        inner.insert(name.to_string(), entry);
        Ok(())
    }

    /// Whether an identity is currently connected (any auth state).
    pub async fn is_online(&self, identity: &str) -> bool {
        self.inner.lock().await.contains_key(identity)
    }

    /// Number of live connections, authenticated or not.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether no connections are live.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Deliver an assembled line to every authenticated session.
    ///
    /// The registry lock is held for the whole fan-out. Per-recipient
    /// failures do not abort delivery to the rest; the names that failed
    /// are returned for logging.
    pub async fn deliver_to_authenticated(&self, line: &str) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut failed = Vec::new();
        for (name, entry) in inner.iter() {
            if !entry.authenticated {
                continue;
            }
            if wire::write_line(&entry.writer, line).await.is_err() {
                failed.push(name.clone());
            }
        }
        failed
    }

    /// Deliver an assembled line to one named session.
    ///
    /// Returns true only if the target is live, authenticated, and the
    /// write succeeded.
    pub async fn deliver_to(&self, name: &str, line: &str) -> bool {
        let inner = self.inner.lock().await;
        match inner.get(name) {
            Some(entry) if entry.authenticated => {
                wire::write_line(&entry.writer, line).await.is_ok()
            }
            _ => false,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
