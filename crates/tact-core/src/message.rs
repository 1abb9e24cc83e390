use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message category. Display order is fixed: urgent, personal, work, other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Urgent,
    Personal,
    Work,
    Other,
}

impl MessageCategory {
    /// All categories in display order.
    pub const ORDER: [MessageCategory; 4] = [
        MessageCategory::Urgent,
        MessageCategory::Personal,
        MessageCategory::Work,
        MessageCategory::Other,
    ];

    /// Position in [`ORDER`](Self::ORDER).
    pub fn index(self) -> usize {
        match self {
            MessageCategory::Urgent => 0,
            MessageCategory::Personal => 1,
            MessageCategory::Work => 2,
            MessageCategory::Other => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageCategory::Urgent => "urgent",
            MessageCategory::Personal => "personal",
            MessageCategory::Work => "work",
            MessageCategory::Other => "other",
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" => Ok(MessageCategory::Urgent),
            "personal" => Ok(MessageCategory::Personal),
            "work" => Ok(MessageCategory::Work),
            "other" => Ok(MessageCategory::Other),
            _ => Err(ParseError::new("category", s)),
        }
    }
}

/// Emotional tone, as supplied by the classification collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Calm,
    Urgent,
    Empathy,
    Anger,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Calm => "calm",
            Tone::Urgent => "urgent",
            Tone::Empathy => "empathy",
            Tone::Anger => "anger",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calm" => Ok(Tone::Calm),
            "urgent" => Ok(Tone::Urgent),
            "empathy" => Ok(Tone::Empathy),
            "anger" => Ok(Tone::Anger),
            _ => Err(ParseError::new("tone", s)),
        }
    }
}

/// Unrecognised name for one of the closed value sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseError {}

/// Urgency score outside 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrgencyOutOfRange(pub f64);

impl fmt::Display for UrgencyOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "urgency score {} outside 0..=1", self.0)
    }
}

impl std::error::Error for UrgencyOutOfRange {}

/// An incoming message. Immutable apart from the read flag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: String,
    pub body: String,
    /// Unix seconds.
    pub timestamp: u64,
    urgency: f64,
    pub tone: Tone,
    pub category: MessageCategory,
    pub is_read: bool,
}

impl Message {
    /// Build a message, rejecting an urgency score outside 0..=1 (NaN included).
    pub fn new(
        sender: &str,
        body: &str,
        urgency: f64,
        tone: Tone,
        category: MessageCategory,
    ) -> Result<Self, UrgencyOutOfRange> {
        if !(0.0..=1.0).contains(&urgency) {
            return Err(UrgencyOutOfRange(urgency));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            sender: sender.to_string(),
            body: body.to_string(),
            timestamp: now_unix_secs(),
            urgency,
            tone,
            category,
            is_read: false,
        })
    }

    /// Build a message, clamping urgency into 0..=1. NaN becomes 0.
    pub fn clamped(
        sender: &str,
        body: &str,
        urgency: f64,
        tone: Tone,
        category: MessageCategory,
    ) -> Self {
        let urgency = if urgency.is_nan() {
            0.0
        } else {
            urgency.clamp(0.0, 1.0)
        };
        Self {
            id: Uuid::new_v4(),
            sender: sender.to_string(),
            body: body.to_string(),
            timestamp: now_unix_secs(),
            urgency,
            tone,
            category,
            is_read: false,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }

    pub fn urgency(&self) -> f64 {
        self.urgency
    }

    /// Drafts and sends are keyed by sender identity.
    pub fn conversation_key(&self) -> &str {
        &self.sender
    }

    /// Single-line body, cut to [`SUMMARY_CHARS`] with an ellipsis.
    pub fn summary(&self) -> String {
        let single = self.body.replace("\r\n", " ").replace(['\n', '\r'], " ");
        let single = single.trim();
        if single.chars().count() <= SUMMARY_CHARS {
            return single.to_string();
        }
        let mut out: String = single.chars().take(SUMMARY_CHARS - 1).collect();
        out.push('\u{2026}');
        out
    }
}

/// Longest summary shown in summary reading mode.
pub const SUMMARY_CHARS: usize = 120;

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
