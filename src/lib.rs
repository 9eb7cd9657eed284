//! Serial round-trip library
//!
//! Opens a serial device, configures the line, sends a payload and reads
//! back whatever arrives within a timeout.
//!
//! # Modules
//!
//! - `port`: device service boundary, `serialport` backend, mock, bounded transfers
//! - `session`: the open device handle and its operations
//! - `exchange`: the fixed send-and-receive sequence
//! - `error`: failure classification and exit codes
//! - `config`: TOML configuration with environment overrides
//! - `logging`: tracing subscriber setup
//!
//! # Example
//!
//! ```
//! use serial_roundtrip::exchange::{run_exchange, ExchangeSettings};
//! use serial_roundtrip::port::{MockDeviceService, MockSerialPort};
//!
//! let service = MockDeviceService::new().with_device(MockSerialPort::loopback("X"));
//! let settings = ExchangeSettings {
//!     port: "X".to_string(),
//!     ..ExchangeSettings::default()
//! };
//!
//! let mut out = Vec::new();
//! let report = run_exchange(&service, &settings, &mut out)?;
//! assert!(report.echo_matches);
//! # Ok::<(), serial_roundtrip::SessionError>(())
//! ```

pub mod config;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod port;
pub mod session;

// Re-export commonly used types for convenience
pub use error::{AppError, ErrorClass, SessionError, Stage};
pub use exchange::{run_exchange, ExchangeReport, ExchangeSettings};
pub use port::{
    DataBits, DeviceInfo, FlowControl, LineConfig, MockDeviceService, MockSerialPort, OpenMode,
    Parity, PortError, SerialDeviceService, SerialPortAdapter, StopBits, SyncSerialPort,
    SystemSerialService, Timeout, TransferCount,
};
pub use session::PortSession;

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
