//! Outgoing send contract.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use futures_util::future::BoxFuture;

/// The transport could not deliver a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendError {
    pub key: String,
    pub reason: String,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "send to '{}' failed: {}", self.key, self.reason)
    }
}

impl std::error::Error for SendError {}

pub trait SendTransport: Send + Sync {
    fn send(&self, key: String, text: String) -> BoxFuture<'static, Result<(), SendError>>;
}

/// Transport that succeeds or fails on demand and records what it sent.
#[derive(Clone, Default)]
pub struct MockTransport {
    failing: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let t = Self::default();
        t.set_failing(true);
        t
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successfully delivered (key, text) pairs.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SendTransport for MockTransport {
    fn send(&self, key: String, text: String) -> BoxFuture<'static, Result<(), SendError>> {
        let failing = self.failing.load(Ordering::SeqCst);
        let sent = Arc::clone(&self.sent);
        Box::pin(async move {
            if failing {
                return Err(SendError {
                    key,
                    reason: "transport unavailable".to_string(),
                });
            }
            sent.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((key, text));
            Ok(())
        })
    }
}
