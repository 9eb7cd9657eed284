//! Port-specific error types.
//!
//! These describe what the serial device service reported. They are
//! classified into session-level failures by [`crate::error::SessionError`].

use super::traits::Direction;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// No device with this name exists on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// The caller passed a malformed parameter.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The OS refused access to the device.
    #[error("Access denied to {0}")]
    AccessDenied(String),

    /// The device is held by someone else or has gone away.
    #[error("Device unavailable: {0}")]
    Unavailable(String),

    /// The request is valid but the device or driver cannot honour it.
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// A transfer was attempted in a direction the open mode does not grant.
    #[error("Port is not open for {0}")]
    NotOpenFor(Direction),

    /// An I/O error occurred during a transfer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create an InvalidInput error from a message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an Unsupported error from a message.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Classify a failure from `serialport` when opening `port_name`.
    pub fn from_open(port_name: &str, err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => {
                Self::Unavailable(format!("{port_name}: {}", err.description))
            }
            serialport::ErrorKind::InvalidInput => Self::InvalidInput(err.description),
            serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => Self::not_found(port_name),
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                Self::AccessDenied(format!("{port_name}: {}", err.description))
            }
            _ => Self::Serial(err),
        }
    }

    /// Classify a failure from `serialport` when applying one line setting.
    ///
    /// Drivers report values they cannot produce as `InvalidInput`.
    pub fn from_setting(setting: &str, err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::InvalidInput => {
                Self::Unsupported(format!("{setting}: {}", err.description))
            }
            serialport::ErrorKind::NoDevice => Self::Unavailable(err.description),
            _ => Self::Serial(err),
        }
    }

    /// True when the transport gave up waiting rather than failing.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if matches!(e.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock)
        )
    }

    /// True when the call was interrupted by a signal and may be retried.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "Serial port not found: /dev/ttyUSB0");

        let err = PortError::unsupported("baud rate 12345");
        assert_eq!(err.to_string(), "Not supported: baud rate 12345");

        let err = PortError::NotOpenFor(Direction::Write);
        assert_eq!(err.to_string(), "Port is not open for writing");
    }

    #[test]
    fn test_timeout_detection() {
        let err = PortError::Io(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        assert!(err.is_timeout());

        let err = PortError::Io(io::Error::new(io::ErrorKind::WouldBlock, "no data"));
        assert!(err.is_timeout());

        let err = PortError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(!err.is_timeout());
        assert!(!PortError::not_found("X").is_timeout());
    }

    #[test]
    fn test_open_classification() {
        let err = serialport::Error::new(serialport::ErrorKind::NoDevice, "unplugged");
        assert!(matches!(
            PortError::from_open("/dev/ttyUSB0", err),
            PortError::Unavailable(msg) if msg.contains("unplugged")
        ));

        let err = serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
            "EACCES",
        );
        assert!(matches!(
            PortError::from_open("/dev/ttyUSB0", err),
            PortError::AccessDenied(_)
        ));
    }

    #[test]
    fn test_setting_classification() {
        let err = serialport::Error::new(serialport::ErrorKind::InvalidInput, "bad rate");
        match PortError::from_setting("baud rate 31", err) {
            PortError::Unsupported(msg) => assert_eq!(msg, "baud rate 31: bad rate"),
            other => panic!("Expected Unsupported, got: {:?}", other),
        }
    }
}
