//! TOML-based configuration for the device binary.
//!
//! Every field carries a serde default so that a missing file and a file
//! from an older build both work: on first run the binary simply runs with
//! defaults.  Example:
//!
//! ```toml
//! [device]
//! name = "left-paddle"
//! address = "02:00:00:00:00:01"
//!
//! [radio]
//! port = 24642
//!
//! [game]
//! tick_ms = 50
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub game: GameConfig,
}

/// Identity of this device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Human-readable name, shown in logs only.
    #[serde(default = "default_name")]
    pub name: String,
    /// This device's 6-byte radio address in `aa:bb:cc:dd:ee:ff` form.
    /// The real device reads this from hardware; the LAN stand-in needs it
    /// configured so two instances do not collide.
    #[serde(default = "default_address")]
    pub address: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Radio transport settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadioConfig {
    /// UDP port shared by all devices on the LAN segment.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Game loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    /// Fixed tick interval in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            address: default_address(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_name() -> String {
    "airpong".to_string()
}

fn default_address() -> String {
    "02:00:00:00:00:01".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    24642
}

fn default_tick_ms() -> u64 {
    50
}

// ── Load / save ───────────────────────────────────────────────────────────────

/// Loads the configuration from `path`, returning defaults if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`ConfigError`] for I/O failures other than "not found" and for
/// malformed TOML.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(toml::from_str(&text)?)
}

/// Writes the configuration to `path` as TOML.
///
/// # Errors
///
/// Returns [`ConfigError`] for serialization or I/O failures.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(config)?;
    std::fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
