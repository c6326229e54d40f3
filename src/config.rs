//! Configuration for tapelink.
//!
//! Settings are read from `~/.tapelink/config.toml`, or from the file named
//! by `--config` / `TAPELINK_CONFIG`. Every key is optional.
//!
//! # Configuration File
//!
//! ```toml
//! # tracing filter, RUST_LOG takes precedence
//! log_level = "info"
//! # log_file = "/var/log/tapelink.log"
//!
//! # Refuse baud rates outside the supported set instead of
//! # letting the driver fall back to its previous rate
//! strict_baud = false
//!
//! [reader]
//! baud = 4800
//! handshake_line = "dtr"     # or "rts"
//! pulse_hold_us = 1
//! release_delay_ms = 10
//! poll_interval_ms = 1
//! poll_budget = 50
//! trailing_zero_budget = 50
//! settle_ms = 4000
//!
//! [punch]
//! baud = 600
//! settle_ms = 1000
//! write_timeout_ms = 1000
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reader::{ReaderSettings, SessionLimits};
use crate::serial::HandshakeSignal;

/// Environment variable naming an alternate config file
pub const CONFIG_ENV: &str = "TAPELINK_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// tracing filter directive
    pub log_level: String,
    /// Append logs here instead of stderr
    pub log_file: Option<PathBuf>,
    pub strict_baud: bool,
    pub reader: ReaderConfig,
    pub punch: PunchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            strict_baud: false,
            reader: ReaderConfig::default(),
            punch: PunchConfig::default(),
        }
    }
}

/// Reader (receive) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub baud: u32,
    pub handshake_line: HandshakeSignal,
    pub pulse_hold_us: u64,
    pub release_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_budget: u32,
    pub trailing_zero_budget: u32,
    pub settle_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        let limits = SessionLimits::default();
        Self {
            baud: 4800,
            handshake_line: HandshakeSignal::Dtr,
            pulse_hold_us: 1,
            release_delay_ms: 10,
            poll_interval_ms: 1,
            poll_budget: limits.poll_budget,
            trailing_zero_budget: limits.trailing_zero_budget,
            settle_ms: 4000,
        }
    }
}

impl ReaderConfig {
    pub fn settings(&self) -> ReaderSettings {
        ReaderSettings {
            signal: self.handshake_line,
            pulse_hold: Duration::from_micros(self.pulse_hold_us),
            release_delay: Duration::from_millis(self.release_delay_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            limits: SessionLimits::new(self.poll_budget, self.trailing_zero_budget),
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Punch (transmit) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PunchConfig {
    pub baud: u32,
    pub settle_ms: u64,
    /// How long a single line write may block
    pub write_timeout_ms: u64,
}

impl Default for PunchConfig {
    fn default() -> Self {
        Self {
            baud: 600,
            settle_ms: 1000,
            write_timeout_ms: 1000,
        }
    }
}

impl PunchConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path (argument, then `TAPELINK_CONFIG`) must exist. The
    /// default location is optional and falls back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        if let Some(path) = explicit.map(Path::to_path_buf).or(from_env) {
            return Self::load_from(&path);
        }

        match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".tapelink").join("config.toml"))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_device() {
        let config = Config::default();
        assert_eq!(config.reader.baud, 4800);
        assert_eq!(config.punch.baud, 600);
        assert!(!config.strict_baud);

        let settings = config.reader.settings();
        assert_eq!(settings.signal, HandshakeSignal::Dtr);
        assert_eq!(settings.poll_interval, Duration::from_millis(1));
        assert_eq!(settings.limits, SessionLimits::default());
        assert_eq!(config.reader.settle(), Duration::from_secs(4));
        assert_eq!(config.punch.settle(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse(
            r#"
            strict_baud = true

            [reader]
            handshake_line = "rts"
            trailing_zero_budget = 80
            "#,
        )
        .unwrap();

        assert!(config.strict_baud);
        assert_eq!(config.reader.handshake_line, HandshakeSignal::Rts);
        assert_eq!(config.reader.trailing_zero_budget, 80);
        // Untouched keys keep their defaults
        assert_eq!(config.reader.poll_budget, 50);
        assert_eq!(config.punch, PunchConfig::default());
    }

    #[test]
    fn test_bad_signal_rejected() {
        assert!(Config::parse("[reader]\nhandshake_line = \"cts\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"\n[punch]\nbaud = 1200").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.punch.baud, 1200);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_unparsable_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reader\nbaud = ").unwrap();
        assert!(matches!(Config::load_from(file.path()), Err(ConfigError::Parse { .. })));
    }
}
