//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_ROUNDTRIP";

/// Config file name looked up in the current directory
const CONFIG_FILE_NAME: &str = "serial-roundtrip.toml";

/// Config file name inside the platform config directory
const APP_CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_ROUNDTRIP_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `explicit` (from the command line); it must exist
    /// 2. `SERIAL_ROUNDTRIP_CONFIG` environment variable
    /// 3. `./serial-roundtrip.toml`
    /// 4. `<platform config dir>/serial-roundtrip/config.toml`
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables override file values.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from(path);
        }

        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> ConfigResult<Self> {
        let mut config = Config::default();
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: None,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the default config file path, e.g. `~/.config/serial-roundtrip/config.toml`.
pub fn get_default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "serial-roundtrip")
        .map(|dirs| dirs.config_dir().join(APP_CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Read and parse `<ENV_PREFIX>_<key>` if it is set.
fn env_value<T: FromStr>(key: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{key}");
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse(var, format!("Invalid {what}"))),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern `SERIAL_ROUNDTRIP_<SECTION>_<KEY>`,
/// e.g. `SERIAL_ROUNDTRIP_SERIAL_PORT=/dev/ttyUSB0`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(port) = env_value::<String>("SERIAL_PORT", "port name")? {
        config.serial.port = port;
    }
    if let Some(baud) = env_value("SERIAL_BAUD_RATE", "baud rate")? {
        config.serial.baud_rate = baud;
    }
    if let Some(timeout) = env_value("SERIAL_TIMEOUT_MS", "timeout")? {
        config.serial.timeout_ms = timeout;
    }
    if let Some(read_len) = env_value("SERIAL_READ_LEN", "read length")? {
        config.serial.read_len = read_len;
    }
    if let Some(level) = env_value::<String>("LOGGING_LEVEL", "log level")? {
        config.logging.level = level;
    }

    Ok(())
}
