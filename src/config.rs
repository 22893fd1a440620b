//! # Configuration Management
//!
//! Centralized configuration for the downstream ingestion pipeline.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Security Considerations
//! - The decompressed size ceiling (4 MiB) stops decompression bombs
//! - The transport frame ceiling bounds a single compressed batch before it is buffered

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Max allowed size of a decompressed batch (4 MiB)
pub const MAX_DECOMPRESSED_SIZE: usize = 4 * 1024 * 1024;

/// Max allowed size of a single compressed batch read from the transport
pub const MAX_TRANSPORT_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProxyConfig {
    /// Batch decoder configuration
    #[serde(default)]
    pub decoder: DecoderConfig,

    /// Failure diagnostics configuration
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProxyConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(size) = std::env::var("PROXY_TRANSPORT_MAX_DECOMPRESSED_SIZE") {
            config.decoder.max_decompressed_size = size.parse::<usize>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid max decompressed size '{size}': {e}"))
            })?;
        }

        if let Ok(dir) = std::env::var("PROXY_TRANSPORT_DUMP_DIRECTORY") {
            config.diagnostics.dump_directory = Some(dir);
        }

        if let Ok(level) = std::env::var("PROXY_TRANSPORT_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid log level: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.decoder.validate());
        errors.extend(self.diagnostics.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Batch decoder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Ceiling for the decompressed size of one batch
    pub max_decompressed_size: usize,

    /// Ceiling for one compressed batch as read off the transport
    pub max_transport_frame_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: MAX_DECOMPRESSED_SIZE,
            max_transport_frame_size: MAX_TRANSPORT_FRAME_SIZE,
        }
    }
}

impl DecoderConfig {
    /// Validate decoder configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_decompressed_size == 0 {
            errors.push("Max decompressed size cannot be 0".to_string());
        } else if self.max_decompressed_size > 64 * 1024 * 1024 {
            errors.push(format!(
                "Max decompressed size too large: {} bytes (maximum recommended: 64 MB)",
                self.max_decompressed_size
            ));
        }

        if self.max_transport_frame_size < 1024 {
            errors.push("Max transport frame size too small (minimum: 1 KB)".to_string());
        }

        errors
    }
}

/// Failure diagnostics configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Whether fatal batch failures produce a buffer dump
    pub dump_on_failure: bool,

    /// Whether the dump carries a base64 copy after the hex dump
    pub include_base64: bool,

    /// Directory for persisted dumps (if unset, dumps are only logged)
    #[serde(default)]
    pub dump_directory: Option<String>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            dump_on_failure: true,
            include_base64: true,
            dump_directory: None,
        }
    }
}

impl DiagnosticsConfig {
    /// Validate diagnostics configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(ref dir) = self.dump_directory {
            if dir.is_empty() {
                errors.push("Dump directory cannot be empty when set".to_string());
            } else if !Path::new(dir).is_dir() {
                errors.push(format!("Dump directory does not exist: {dir}"));
            }
        }

        if !self.dump_on_failure && self.dump_directory.is_some() {
            errors.push(
                "WARNING: dump_directory is set but dump_on_failure is disabled".to_string(),
            );
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("proxy-transport"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
