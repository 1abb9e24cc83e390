//! Collaborator contracts for messages and drafts, with in-memory versions.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::message::Message;

/// Source of the message set a session reads.
pub trait MessageRepository: Send {
    fn load_messages(&mut self) -> Vec<Message>;
    fn mark_read(&mut self, id: Uuid);
    fn is_read(&self, id: Uuid) -> bool;
}

/// Per-conversation draft text, keyed by conversation key.
pub trait DraftStore: Send {
    fn save(&mut self, key: &str, text: &str);
    fn load(&self, key: &str) -> Option<String>;
    fn clear(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    messages: Vec<Message>,
    read: HashSet<Uuid>,
}

impl InMemoryRepository {
    pub fn new(messages: Vec<Message>) -> Self {
        let read = messages.iter().filter(|m| m.is_read).map(|m| m.id).collect();
        Self { messages, read }
    }

    pub fn push(&mut self, message: Message) {
        if message.is_read {
            self.read.insert(message.id);
        }
        self.messages.push(message);
    }
}

impl MessageRepository for InMemoryRepository {
    fn load_messages(&mut self) -> Vec<Message> {
        self.messages
            .iter()
            .cloned()
            .map(|m| {
                let read = self.read.contains(&m.id);
                m.with_read(read)
            })
            .collect()
    }

    fn mark_read(&mut self, id: Uuid) {
        self.read.insert(id);
    }

    fn is_read(&self, id: Uuid) -> bool {
        self.read.contains(&id)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryDrafts {
    drafts: HashMap<String, String>,
}

impl InMemoryDrafts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

impl DraftStore for InMemoryDrafts {
    fn save(&mut self, key: &str, text: &str) {
        self.drafts.insert(key.to_string(), text.to_string());
    }

    fn load(&self, key: &str) -> Option<String> {
        self.drafts.get(key).cloned()
    }

    fn clear(&mut self, key: &str) {
        self.drafts.remove(key);
    }
}
