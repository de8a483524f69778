//! Configuration management for session-keeper.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::online::{ShowMode, WhosOnline};
use crate::session::{Clock, FileHandler, MemoryHandler, SessionConfig, SessionHandler};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session configuration.
    pub session: SessionSection,
    /// Who-is-online configuration.
    pub online: OnlineSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Storage driver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    /// Process-local map; sessions vanish on exit.
    Memory,
    /// One JSON file per session under `session.path`.
    #[default]
    File,
}

impl FromStr for HandlerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(HandlerKind::Memory),
            "file" => Ok(HandlerKind::File),
            other => Err(format!("unknown session handler: {}", other)),
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Memory => f.write_str("memory"),
            HandlerKind::File => f.write_str("file"),
        }
    }
}

/// Session configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Cookie name.
    pub name: String,
    /// Inactivity expiry in seconds.
    pub lifetime_secs: u64,
    /// Storage driver.
    pub handler: HandlerKind,
    /// Directory for the file driver.
    pub path: PathBuf,
    /// Write lease duration in seconds.
    pub lock_lease_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            name: defaults.name,
            lifetime_secs: defaults.expire.as_secs(),
            handler: HandlerKind::default(),
            path: std::env::temp_dir().join("session-keeper"),
            lock_lease_secs: defaults.lock_lease.as_secs(),
        }
    }
}

/// Who-is-online section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineSection {
    /// Whether who-is-online reports are available.
    pub session_metadata: bool,
    /// Report contents.
    pub show_mode: ShowMode,
}

impl Default for OnlineSection {
    fn default() -> Self {
        Self {
            session_metadata: true,
            show_mode: ShowMode::default(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("SESSION_KEEPER_NAME") {
            if !name.is_empty() {
                self.session.name = name;
            }
        }

        if let Ok(kind) = std::env::var("SESSION_KEEPER_HANDLER") {
            if let Ok(kind) = kind.parse() {
                self.session.handler = kind;
            }
        }

        if let Ok(path) = std::env::var("SESSION_KEEPER_PATH") {
            if !path.is_empty() {
                self.session.path = PathBuf::from(path);
            }
        }

        if let Ok(lifetime) = std::env::var("SESSION_KEEPER_LIFETIME") {
            if let Ok(lifetime) = lifetime.parse() {
                self.session.lifetime_secs = lifetime;
            }
        }

        if let Ok(level) = std::env::var("SESSION_KEEPER_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(kind) = args.handler {
            self.session.handler = kind;
        }

        if let Some(ref path) = args.path {
            self.session.path = path.clone();
        }

        if let Some(lifetime) = args.lifetime {
            self.session.lifetime_secs = lifetime;
        }

        if let Some(mode) = args.mode {
            self.online.show_mode = mode;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject settings no driver can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.name.is_empty() {
            return Err(ConfigError::InvalidValue("session.name", String::new()));
        }
        if self.session.handler == HandlerKind::File && self.session.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("session.path", String::new()));
        }
        if self.session.lock_lease_secs == 0 {
            return Err(ConfigError::InvalidValue("session.lock_lease_secs", "0".to_string()));
        }
        Ok(())
    }

    /// Lifecycle settings for [`Session`](crate::Session).
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            name: self.session.name.clone(),
            expire: Duration::from_secs(self.session.lifetime_secs),
            lock_lease: Duration::from_secs(self.session.lock_lease_secs),
        }
    }

    /// Construct the configured storage driver.
    pub fn build_handler(&self, clock: Arc<dyn Clock>) -> crate::Result<Arc<dyn SessionHandler>> {
        let handler: Arc<dyn SessionHandler> = match self.session.handler {
            HandlerKind::Memory => Arc::new(MemoryHandler::with_clock(clock)),
            HandlerKind::File => {
                Arc::new(FileHandler::with_clock(self.session.path.clone(), clock)?)
            }
        };
        Ok(handler)
    }

    /// Who-is-online reporter for the configured mode.
    pub fn whos_online(&self) -> WhosOnline {
        WhosOnline::new(self.online.show_mode, self.online.session_metadata)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Setting with an unusable value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidValue(key, value) => write!(f, "invalid value for {}: '{}'", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}
