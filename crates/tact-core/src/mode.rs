//! Session mode and its sub-states as sum types.

use serde::Serialize;

use crate::message::Message;
use crate::signature::HapticSignature;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavigateContext {
    Apps,
    Conversations { app_id: String },
    GenericList { title: String, items: Vec<String> },
}

/// The message being read, where it was opened from, and how it should feel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReadContext {
    pub message: Message,
    pub app_id: Option<String>,
    pub signature: HapticSignature,
}

impl ReadContext {
    /// Signature derived from the message's category and urgency.
    pub fn new(message: Message, app_id: Option<String>) -> Self {
        let signature = HapticSignature::for_message(&message);
        Self {
            message,
            app_id,
            signature,
        }
    }

    pub fn with_signature(mut self, signature: HapticSignature) -> Self {
        self.signature = signature;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "mode", content = "context", rename_all = "lowercase")]
pub enum SessionMode {
    Home,
    Navigate(NavigateContext),
    Read(ReadContext),
}

impl SessionMode {
    pub fn name(&self) -> &'static str {
        match self {
            SessionMode::Home => "home",
            SessionMode::Navigate(_) => "navigate",
            SessionMode::Read(_) => "read",
        }
    }
}

/// Security alert progression. `Frozen` and `Calling` only leave via dismissal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FraudAlertPhase {
    Alert,
    Frozen,
    Calling,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingMode {
    #[default]
    Summary,
    Full,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Sequential,
    Chorded,
}

impl InputMode {
    pub fn toggled(self) -> Self {
        match self {
            InputMode::Sequential => InputMode::Chorded,
            InputMode::Chorded => InputMode::Sequential,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SendResult {
    Sent,
    Failed,
}
