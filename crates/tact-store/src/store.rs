use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use tact_core::{Message, MessageCategory, Tone};

use crate::error::{Result, StoreError};
use crate::schema;

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        tracing::info!(path = %path.display(), "store opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Messages ---

    /// Insert or update a message. An existing read flag is never cleared.
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        insert_message_on(&self.conn, message)
    }

    /// Insert a batch in one transaction. Returns the number written.
    pub fn insert_messages(&self, messages: &[Message]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for message in messages {
            insert_message_on(&tx, message)?;
        }
        tx.commit()?;
        Ok(messages.len())
    }

    /// All messages in arrival order. Rows that no longer decode are
    /// logged and skipped.
    pub fn list_messages(&self) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT rowid, id, sender, body, timestamp, urgency, tone, category, is_read
             FROM messages ORDER BY timestamp, rowid",
        )?;
        let mut rows = stmt.query([])?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            let rowid: i64 = row.get(0)?;
            let decoded = match MessageRow::from_row(row) {
                Ok(raw) => raw.into_message(),
                Err(
                    e @ (rusqlite::Error::InvalidColumnType(..)
                    | rusqlite::Error::FromSqlConversionFailure(..)
                    | rusqlite::Error::IntegralValueOutOfRange(..)),
                ) => Err(StoreError::InvalidData(e.to_string())),
                Err(e) => return Err(e.into()),
            };
            match decoded {
                Ok(message) => messages.push(message),
                Err(e) => tracing::warn!(rowid, error = %e, "skipping unreadable message row"),
            }
        }
        Ok(messages)
    }

    pub fn message_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Returns false when no message has this id.
    pub fn mark_read(&self, id: Uuid) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE messages SET is_read = 1 WHERE id = ?1",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }

    pub fn is_read(&self, id: Uuid) -> Result<bool> {
        let flag: Option<i64> = self
            .conn
            .query_row(
                "SELECT is_read FROM messages WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(flag.is_some_and(|f| f != 0))
    }

    pub fn clear_messages(&self) -> Result<()> {
        self.conn.execute("DELETE FROM messages", [])?;
        Ok(())
    }

    // --- Drafts ---

    pub fn save_draft(&self, key: &str, text: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO drafts (key, text, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET text = excluded.text, updated_at = excluded.updated_at",
            params![key, text],
        )?;
        Ok(())
    }

    pub fn load_draft(&self, key: &str) -> Result<Option<String>> {
        let text = self
            .conn
            .query_row("SELECT text FROM drafts WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(text)
    }

    pub fn clear_draft(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM drafts WHERE key = ?1", [key])?;
        Ok(())
    }

    /// `(key, text)` pairs, most recently updated first.
    pub fn list_drafts(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, text FROM drafts ORDER BY updated_at DESC, key")?;
        let drafts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(drafts)
    }
}

fn insert_message_on(conn: &Connection, m: &Message) -> Result<()> {
    let timestamp = i64::try_from(m.timestamp).map_err(|_| {
        StoreError::InvalidData(format!(
            "message {}: timestamp {} out of range",
            m.id, m.timestamp
        ))
    })?;
    conn.execute(
        "INSERT INTO messages (id, sender, body, timestamp, urgency, tone, category, is_read)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             sender = excluded.sender,
             body = excluded.body,
             timestamp = excluded.timestamp,
             urgency = excluded.urgency,
             tone = excluded.tone,
             category = excluded.category,
             is_read = max(is_read, excluded.is_read)",
        params![
            m.id.to_string(),
            m.sender,
            m.body,
            timestamp,
            m.urgency(),
            m.tone.as_str(),
            m.category.as_str(),
            m.is_read as i32,
        ],
    )?;
    Ok(())
}

struct MessageRow {
    id: String,
    sender: String,
    body: String,
    timestamp: i64,
    urgency: f64,
    tone: String,
    category: String,
    is_read: bool,
}

impl MessageRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            sender: row.get("sender")?,
            body: row.get("body")?,
            timestamp: row.get("timestamp")?,
            urgency: row.get("urgency")?,
            tone: row.get("tone")?,
            category: row.get("category")?,
            is_read: row.get::<_, i32>("is_read")? != 0,
        })
    }

    fn into_message(self) -> Result<Message> {
        let id = parse_uuid(&self.id)?;
        let tone: Tone = self
            .tone
            .parse()
            .map_err(|e| StoreError::InvalidData(format!("message {id}: {e}")))?;
        let category: MessageCategory = self
            .category
            .parse()
            .map_err(|e| StoreError::InvalidData(format!("message {id}: {e}")))?;
        let message = Message::new(&self.sender, &self.body, self.urgency, tone, category)
            .map_err(|e| StoreError::InvalidData(format!("message {id}: {e}")))?;
        Ok(message
            .with_id(id)
            .with_timestamp(self.timestamp.max(0) as u64)
            .with_read(self.is_read))
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidData(format!("invalid UUID '{s}': {e}")))
}
