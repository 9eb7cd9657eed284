//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `SerialPortAdapter`, and device lookup with `SystemSerialService`.

use super::error::PortError;
use super::traits::{
    DataBits, DeviceInfo, DeviceKind, FlowControl, OpenMode, Parity, SerialDeviceService,
    SerialPortAdapter, StopBits,
};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Rate passed to the driver when opening, before the line is configured.
const OPEN_BAUD_RATE: u32 = 9600;

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
    mode: OpenMode,
}

impl SyncSerialPort {
    /// Open a serial port for exclusive access.
    ///
    /// The line keeps the driver's opening parameters until the setters
    /// are called. `serialport` always opens read-write; `mode` is enforced
    /// by the blocking transfers, not by the OS.
    ///
    /// # Example
    /// ```no_run
    /// use serial_roundtrip::port::{OpenMode, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", OpenMode::ReadWrite)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, mode: OpenMode) -> Result<Self, PortError> {
        let port = serialport::new(port_name, OPEN_BAUD_RATE)
            .open()
            .map_err(|e| PortError::from_open(port_name, e))?;

        Ok(Self {
            port,
            name: port_name.to_string(),
            mode,
        })
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), PortError> {
        self.port
            .set_baud_rate(baud_rate)
            .map_err(|e| PortError::from_setting(&format!("baud rate {baud_rate}"), e))
    }

    fn set_data_bits(&mut self, data_bits: DataBits) -> Result<(), PortError> {
        self.port
            .set_data_bits(data_bits.into())
            .map_err(|e| PortError::from_setting(&format!("{} data bits", data_bits.bits()), e))
    }

    fn set_parity(&mut self, parity: Parity) -> Result<(), PortError> {
        self.port
            .set_parity(parity.into())
            .map_err(|e| PortError::from_setting(&format!("parity {parity:?}"), e))
    }

    fn set_stop_bits(&mut self, stop_bits: StopBits) -> Result<(), PortError> {
        self.port
            .set_stop_bits(stop_bits.into())
            .map_err(|e| PortError::from_setting(&format!("{} stop bits", stop_bits.count()), e))
    }

    fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<(), PortError> {
        self.port
            .set_flow_control(flow_control.into())
            .map_err(|e| PortError::from_setting(flow_control.describe(), e))
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port.set_timeout(timeout).map_err(PortError::Serial)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(PortError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }

    fn close(self) -> Result<(), PortError> {
        // Dropping the boxed port closes the descriptor.
        drop(self.port);
        Ok(())
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}

/// Device service backed by the operating system's serial drivers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSerialService;

impl SystemSerialService {
    pub fn new() -> Self {
        Self
    }
}

impl SerialDeviceService for SystemSerialService {
    type Port = SyncSerialPort;

    fn resolve(&self, name: &str) -> Result<DeviceInfo, PortError> {
        if name.trim().is_empty() {
            return Err(PortError::invalid_input("empty port name"));
        }

        match serialport::available_ports() {
            Ok(ports) => {
                if let Some(info) = ports.into_iter().find(|p| p.port_name == name) {
                    return Ok(info.into());
                }
            }
            Err(e) => warn!(error = %e, "port enumeration failed, falling back to path lookup"),
        }

        // Ptys and udev symlinks are not enumerated but open fine.
        if Path::new(name).exists() {
            debug!(port = name, "resolved by path");
            return Ok(DeviceInfo::new(name, DeviceKind::Unknown));
        }

        Err(PortError::not_found(name))
    }

    fn open(&self, device: &DeviceInfo, mode: OpenMode) -> Result<Self::Port, PortError> {
        SyncSerialPort::open(device.name(), mode)
    }

    fn list(&self) -> Result<Vec<DeviceInfo>, PortError> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(DeviceInfo::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_nonexistent_port() {
        let result = SystemSerialService::new().resolve("/dev/nonexistent_port_12345");

        match result {
            Err(PortError::NotFound(name)) => assert!(name.contains("nonexistent")),
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_empty_name() {
        let result = SystemSerialService::new().resolve("  ");
        assert!(matches!(result, Err(PortError::InvalidInput(_))));
    }

    #[test]
    fn test_open_nonexistent_port() {
        let result = SyncSerialPort::open("/dev/nonexistent_port_12345", OpenMode::ReadWrite);
        assert!(result.is_err());
    }
}
