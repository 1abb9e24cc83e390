//! Data directory resolution and `config.toml` loading.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::{Deserialize, Serialize};

use tact_core::{DEFAULT_ALERT_SENDER, INACTIVITY_TIMEOUT, SessionConfig};

use crate::error::{Result, StoreError};
use crate::store::Store;

pub const DATA_DIR_ENV: &str = "TACT_DATA_DIR";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub inactivity_timeout_secs: u64,
    pub alert_senders: Vec<String>,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: INACTIVITY_TIMEOUT.as_secs(),
            alert_senders: vec![DEFAULT_ALERT_SENDER.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Database file name, relative to the data directory.
    pub db_file: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            db_file: "tact.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionSection,
    pub store: StoreSection,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// A zero timeout would exit on the first tick; it falls back to the default.
    pub fn to_session_config(&self) -> SessionConfig {
        let inactivity_timeout = match self.session.inactivity_timeout_secs {
            0 => INACTIVITY_TIMEOUT,
            secs => Duration::from_secs(secs),
        };
        SessionConfig {
            inactivity_timeout,
            alert_senders: self.session.alert_senders.clone(),
        }
    }
}

/// Root of everything `tact` persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// `TACT_DATA_DIR` if set, else `$HOME/.tactile`.
    pub fn resolve() -> Self {
        Self::from_env(env::var(DATA_DIR_ENV).ok(), home_dir())
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn from_env(override_dir: Option<String>, home: PathBuf) -> Self {
        match override_dir.filter(|d| !d.trim().is_empty()) {
            Some(dir) => Self::at(dir),
            None => Self::at(home.join(".tactile")),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn db_path(&self, config: &Config) -> PathBuf {
        self.root.join(&config.store.db_file)
    }

    /// A missing file yields defaults; a malformed one is an error.
    pub fn load_config(&self) -> Result<Config> {
        let path = self.config_path();
        match fs::read_to_string(&path) {
            Ok(text) => Config::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Config::default())
            }
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Create the directory if needed and open the configured database.
    pub fn open_store(&self, config: &Config) -> Result<Store> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        Store::open(&self.db_path(config))
    }
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
