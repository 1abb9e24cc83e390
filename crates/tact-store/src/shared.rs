//! One store connection behind both session collaborator contracts.
//!
//! The contracts are infallible, so SQLite failures are logged and degrade to
//! "nothing stored" rather than reaching the session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use tact_core::{DraftStore, Message, MessageRepository};

use crate::store::Store;

#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<Store>>,
}

impl SharedStore {
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Direct access for callers that want the fallible API.
    pub fn lock(&self) -> MutexGuard<'_, Store> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageRepository for SharedStore {
    fn load_messages(&mut self) -> Vec<Message> {
        self.lock().list_messages().unwrap_or_else(|e| {
            tracing::warn!("failed to load messages: {e}");
            Vec::new()
        })
    }

    fn mark_read(&mut self, id: Uuid) {
        match self.lock().mark_read(id) {
            Ok(true) => {}
            Ok(false) => tracing::debug!(%id, "mark_read on unknown message"),
            Err(e) => tracing::warn!(%id, "failed to mark message read: {e}"),
        }
    }

    fn is_read(&self, id: Uuid) -> bool {
        self.lock().is_read(id).unwrap_or_else(|e| {
            tracing::warn!(%id, "failed to read message state: {e}");
            false
        })
    }
}

impl DraftStore for SharedStore {
    fn save(&mut self, key: &str, text: &str) {
        if let Err(e) = self.lock().save_draft(key, text) {
            tracing::warn!(key, "failed to save draft: {e}");
        }
    }

    fn load(&self, key: &str) -> Option<String> {
        self.lock().load_draft(key).unwrap_or_else(|e| {
            tracing::warn!(key, "failed to load draft: {e}");
            None
        })
    }

    fn clear(&mut self, key: &str) {
        if let Err(e) = self.lock().clear_draft(key) {
            tracing::warn!(key, "failed to clear draft: {e}");
        }
    }
}
