use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tact_core::{Message, MessageCategory, Tone};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// Interchange shape for a message. `id`, `timestamp` and `is_read` are optional
/// on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub sender: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    pub urgency: f64,
    pub tone: Tone,
    pub category: MessageCategory,
    #[serde(default)]
    pub is_read: bool,
}

impl MessageRecord {
    /// Rejects urgency outside 0..=1 instead of clamping.
    pub fn into_message(self) -> Result<Message> {
        let mut message = Message::new(
            &self.sender,
            &self.body,
            self.urgency,
            self.tone,
            self.category,
        )
        .map_err(|e| StoreError::InvalidData(format!("message from {}: {e}", self.sender)))?
        .with_read(self.is_read);
        if let Some(id) = self.id {
            message = message.with_id(id);
        }
        if let Some(ts) = self.timestamp {
            message = message.with_timestamp(ts);
        }
        Ok(message)
    }
}

impl From<&Message> for MessageRecord {
    fn from(m: &Message) -> Self {
        Self {
            id: Some(m.id),
            sender: m.sender.clone(),
            body: m.body.clone(),
            timestamp: Some(m.timestamp),
            urgency: m.urgency(),
            tone: m.tone,
            category: m.category,
            is_read: m.is_read,
        }
    }
}

/// Parse a JSON array of message records. Nothing is written if any record is invalid.
pub fn parse_messages(json: &str) -> Result<Vec<Message>> {
    let records: Vec<MessageRecord> = serde_json::from_str(json)
        .map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))?;
    records.into_iter().map(MessageRecord::into_message).collect()
}

impl Store {
    /// Import a JSON message file. Returns the number of messages written.
    pub fn import_json_file(&self, path: &Path) -> Result<usize> {
        let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.import_json_str(&json)
    }

    pub fn import_json_str(&self, json: &str) -> Result<usize> {
        let messages = parse_messages(json)?;
        let count = self.insert_messages(&messages)?;
        tracing::info!(count, "imported messages");
        Ok(count)
    }

    /// All stored messages as a pretty-printed JSON array.
    pub fn export_json_string(&self) -> Result<String> {
        let records: Vec<MessageRecord> =
            self.list_messages()?.iter().map(MessageRecord::from).collect();
        serde_json::to_string_pretty(&records)
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"sender": "Bank Alert", "body": "Card charged", "urgency": 0.97,
         "tone": "urgent", "category": "urgent", "timestamp": 100},
        {"sender": "Mom", "body": "Dinner?", "urgency": 0.3,
         "tone": "empathy", "category": "personal", "timestamp": 200, "is_read": true}
    ]"#;

    #[test]
    fn test_import_str() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.import_json_str(SAMPLE).unwrap(), 2);

        let msgs = store.list_messages().unwrap();
        assert_eq!(msgs[0].sender, "Bank Alert");
        assert_eq!(msgs[0].category, MessageCategory::Urgent);
        assert!(!msgs[0].is_read);
        assert_eq!(msgs[1].tone, Tone::Empathy);
        assert!(msgs[1].is_read);
    }

    #[test]
    fn test_import_rejects_out_of_range_urgency() {
        let store = Store::open_in_memory().unwrap();
        let bad = r#"[
            {"sender": "A", "body": "ok", "urgency": 0.5, "tone": "calm", "category": "other"},
            {"sender": "B", "body": "no", "urgency": 1.5, "tone": "calm", "category": "other"}
        ]"#;

        let err = store.import_json_str(bad).unwrap_err();
        assert!(err.to_string().contains("from B"), "{err}");
        assert_eq!(store.message_count().unwrap(), 0);
    }

    #[test]
    fn test_import_invalid_json() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.import_json_str("{not json"),
            Err(StoreError::InvalidData(_))
        ));
        assert!(matches!(
            store.import_json_str(r#"[{"sender": "x"}]"#),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_import_missing_file() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .import_json_file(Path::new("/nonexistent/messages.json"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_export_then_import_elsewhere() {
        let a = Store::open_in_memory().unwrap();
        a.insert_messages(&tact_core::DemoScenario::MomBirthday.messages())
            .unwrap();
        let json = a.export_json_string().unwrap();

        let b = Store::open_in_memory().unwrap();
        b.import_json_str(&json).unwrap();
        assert_eq!(a.list_messages().unwrap(), b.list_messages().unwrap());
    }

    #[test]
    fn test_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.json");
        fs::write(&path, SAMPLE).unwrap();

        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.import_json_file(&path).unwrap(), 2);
    }
}
