//! TOML configuration for the demo binary.
//!
//! Looked up at:
//! - Linux:   `$XDG_CONFIG_HOME/monome/config.toml` (or `~/.config/monome/…`)
//! - macOS:   `~/Library/Application Support/monome/config.toml`
//! - Windows: `%APPDATA%\monome\config.toml`
//!
//! ```toml
//! [serialosc]
//! host = "127.0.0.1"
//! port = 12002
//!
//! [session]
//! prefix = "monome"
//! event_queue_depth = 32
//!
//! [demo]
//! device_limit = 2
//! flash_ms = 500
//! log_level = "info"
//! ```
//!
//! Every field is optional; `#[serde(default = "…")]` fills in anything the
//! file leaves out, and a missing file means "all defaults".

use std::net::{AddrParseError, IpAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use monome_core::protocol::address::{DEFAULT_DISCOVERY_PORT, DEFAULT_PREFIX};
use serde::Deserialize;
use thiserror::Error;

use crate::infrastructure::network::{SessionConfig, DEFAULT_EVENT_QUEUE_DEPTH};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

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

    /// `serialosc.host` is not an IP address.
    #[error("invalid serialosc host {host:?}: {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: AddrParseError,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub serialosc: SerialOscConfig,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Where serialosc listens.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SerialOscConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Per-session tunables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// OSC prefix devices are told to use.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Buffered events per session before the receive loop waits.
    #[serde(default = "default_event_queue_depth")]
    pub event_queue_depth: usize,
}

/// Demo binary behaviour.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DemoConfig {
    /// How many discovered devices to drive.
    #[serde(default = "default_device_limit")]
    pub device_limit: usize,
    /// Length of the ready flash, in milliseconds.
    #[serde(default = "default_flash_ms")]
    pub flash_ms: u64,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    DEFAULT_DISCOVERY_PORT
}
fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}
fn default_event_queue_depth() -> usize {
    DEFAULT_EVENT_QUEUE_DEPTH
}
fn default_device_limit() -> usize {
    2
}
fn default_flash_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SerialOscConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            event_queue_depth: default_event_queue_depth(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            device_limit: default_device_limit(),
            flash_ms: default_flash_ms(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Builds the settings every session is started with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHost`] if `serialosc.host` does not
    /// parse as an IP address.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let host: IpAddr = self
            .serialosc
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost {
                host: self.serialosc.host.clone(),
                source,
            })?;

        Ok(SessionConfig {
            host,
            discovery_port: self.serialosc.port,
            prefix: self.session.prefix.clone(),
            event_queue_depth: self.session.event_queue_depth,
        })
    }
}

impl DemoConfig {
    pub fn flash(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default config file path.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `AppConfig` from `path`, or from [`config_file_path`] when `path`
/// is `None`.  A file that does not exist yields `AppConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Parses TOML text into an `AppConfig`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Resolves the platform config base directory including the `monome`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("monome"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("monome"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("monome"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
