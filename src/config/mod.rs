//! Configuration module.
//!
//! TOML configuration with environment variable overrides. Without any
//! file the built-in exchange settings are used.
//!
//! # Configuration Resolution
//!
//! 1. `--config <FILE>` on the command line
//! 2. `SERIAL_ROUNDTRIP_CONFIG` environment variable (explicit path)
//! 3. `./serial-roundtrip.toml` (current directory)
//! 4. `~/.config/serial-roundtrip/config.toml` or the platform equivalent
//! 5. Built-in defaults
//!
//! # Environment Overrides
//!
//! - `SERIAL_ROUNDTRIP_SERIAL_PORT=/dev/ttyUSB0`
//! - `SERIAL_ROUNDTRIP_SERIAL_BAUD_RATE=115200`
//! - `SERIAL_ROUNDTRIP_SERIAL_TIMEOUT_MS=500`
//! - `SERIAL_ROUNDTRIP_SERIAL_READ_LEN=64`
//! - `SERIAL_ROUNDTRIP_LOGGING_LEVEL=debug`
//!
//! # Example file
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//! parity = "none"
//! timeout_ms = 1000
//!
//! [payload]
//! bytes = [0x42, 0x6E, 0x43, 0x50]
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, PayloadConfig, SerialConfig};
