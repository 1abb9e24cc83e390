//! SQLite persistence and configuration for `tact-core` sessions.

pub mod config;
pub mod error;
pub mod json_bridge;
pub mod schema;
pub mod shared;
pub mod store;

pub use config::{Config, DataDir, SessionSection, StoreSection};
pub use error::{Result, StoreError};
pub use json_bridge::{MessageRecord, parse_messages};
pub use shared::SharedStore;
pub use store::Store;
