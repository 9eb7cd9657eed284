//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! Every section has defaults matching the built-in exchange, so an empty
//! file (or no file) runs the stock send-and-receive.

use super::error::{ConfigError, ConfigResult};
use crate::exchange::{
    ExchangeSettings, DEFAULT_PAYLOAD, DEFAULT_PORT, DEFAULT_READ_LEN, DEFAULT_TIMEOUT_MS,
};
use crate::port::{DataBits, FlowControl, LineConfig, Parity, StopBits, Timeout};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Bytes to send
    pub payload: PayloadConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values the device service would reject anyway.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::validation("serial.port", "must not be empty"));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::validation(
                "serial.baud_rate",
                "must be greater than zero",
            ));
        }
        if self.serial.read_len == 0 {
            return Err(ConfigError::validation(
                "serial.read_len",
                "must be greater than zero",
            ));
        }
        if self.payload.bytes.is_empty() {
            return Err(ConfigError::validation("payload.bytes", "must not be empty"));
        }
        Ok(())
    }

    /// Settings for one exchange, with port aliases resolved.
    pub fn exchange_settings(&self) -> ExchangeSettings {
        ExchangeSettings {
            port: self.serial.resolve_port(&self.serial.port),
            line: self.serial.line(),
            payload: self.payload.bytes.clone(),
            timeout: self.serial.timeout(),
            read_len: self.serial.read_len,
        }
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device name or path
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Write and read timeout in milliseconds; 0 waits indefinitely
    pub timeout_ms: u64,
    /// Receive buffer size in bytes
    pub read_len: usize,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let line = LineConfig::default();
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: line.baud_rate,
            data_bits: line.data_bits,
            parity: line.parity,
            stop_bits: line.stop_bits,
            flow_control: line.flow_control,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            read_len: DEFAULT_READ_LEN,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    pub fn line(&self) -> LineConfig {
        LineConfig {
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            parity: self.parity,
            stop_bits: self.stop_bits,
            flow_control: self.flow_control,
        }
    }

    pub fn timeout(&self) -> Timeout {
        Timeout::from_millis(self.timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Payload section. TOML accepts hex literals, e.g. `bytes = [0x42, 0x6E]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    pub bytes: Vec<u8>,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            bytes: DEFAULT_PAYLOAD.to_vec(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    Pretty,
    /// Compact format
    #[default]
    Compact,
}
