use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KakError, Result};

/// How messages reach a session's control channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Stream the message into `kak -p <session>`
    #[default]
    Pipe,
    /// Write the message straight into the runtime entry (a named pipe)
    Fifo,
}

/// Settings loaded from `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Editor executable
    #[serde(default = "default_editor")]
    pub editor: String,

    /// Override for the editor runtime directory
    #[serde(default)]
    pub runtime_dir: Option<PathBuf>,

    /// Control channel transport
    #[serde(default)]
    pub transport: TransportKind,

    /// Where query result pipes are created (system temp dir when unset)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// How long a query waits for the editor to write its result
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,

    /// Delay between readiness probes after spawning a session
    #[serde(default = "default_create_poll_interval")]
    pub create_poll_interval_ms: u64,

    /// Readiness probes before giving up on a spawned session
    #[serde(default = "default_create_max_attempts")]
    pub create_max_attempts: u32,
}

fn default_editor() -> String {
    "kak".to_string()
}

fn default_query_timeout() -> u64 {
    3000
}

fn default_create_poll_interval() -> u64 {
    20
}

fn default_create_max_attempts() -> u32 {
    150
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            editor: default_editor(),
            runtime_dir: None,
            transport: TransportKind::default(),
            temp_dir: None,
            query_timeout_ms: default_query_timeout(),
            create_poll_interval_ms: default_create_poll_interval(),
            create_max_attempts: default_create_max_attempts(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // An explicit path must exist
        if let Some(p) = path {
            return Self::read(p);
        }

        let default_paths = [
            dirs::config_dir().map(|p| p.join("kks/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/kks/config.toml")),
            dirs::home_dir().map(|p| p.join(".kks.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::debug!("Loading settings from {}", path.display());
                return Self::read(path);
            }
        }

        Ok(Self::default())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            KakError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("failed to parse {}: {}", path.display(), e),
            ))
        })
    }

    /// Validate and normalize settings values
    ///
    /// A zero timeout or poll interval would turn waits into busy loops.
    pub fn validate(&mut self) {
        const MIN_QUERY_TIMEOUT: u64 = 10;
        const MIN_POLL_INTERVAL: u64 = 1;

        if self.query_timeout_ms < MIN_QUERY_TIMEOUT {
            self.query_timeout_ms = MIN_QUERY_TIMEOUT;
        }
        if self.create_poll_interval_ms < MIN_POLL_INTERVAL {
            self.create_poll_interval_ms = MIN_POLL_INTERVAL;
        }
        if self.create_max_attempts == 0 {
            self.create_max_attempts = 1;
        }
        if self.editor.trim().is_empty() {
            self.editor = default_editor();
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn create_poll_interval(&self) -> Duration {
        Duration::from_millis(self.create_poll_interval_ms)
    }
}
