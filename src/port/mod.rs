//! Port abstraction layer for serial communication.
//!
//! Provides the device service boundary, the `serialport`-backed
//! implementation, an in-memory mock, and deadline-bounded transfers.

pub mod blocking;
pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use blocking::{blocking_read, blocking_write, Timeout, TransferCount};
pub use error::PortError;
pub use mock::{LineSetting, MockDeviceService, MockSerialPort};
pub use sync_port::*;
pub use traits::*;
