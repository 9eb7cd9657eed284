//! Core traits for the serial device service boundary.
//!
//! `SerialDeviceService` resolves and opens devices; `SerialPortAdapter` is
//! the opened handle. Both have a real implementation over the `serialport`
//! crate and an in-memory mock, so sessions can be driven without hardware.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Line parameters applied to an open port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Flow control mode.
    pub flow_control: FlowControl,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

impl fmt::Display for LineConfig {
    /// Renders as e.g. `9600 8N1, no flow control`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}{}, {}",
            self.baud_rate,
            self.data_bits.bits(),
            self.parity.letter(),
            self.stop_bits.count(),
            self.flow_control.describe()
        )
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    pub fn bits(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl FlowControl {
    pub fn describe(self) -> &'static str {
        match self {
            Self::None => "no flow control",
            Self::Software => "XON/XOFF flow control",
            Self::Hardware => "RTS/CTS flow control",
        }
    }
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Parity {
    pub fn letter(self) -> char {
        match self {
            Self::None => 'N',
            Self::Odd => 'O',
            Self::Even => 'E',
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    pub fn count(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("reading"),
            Self::Write => f.write_str("writing"),
        }
    }
}

/// Access requested when opening a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    Read,
    Write,
    #[default]
    ReadWrite,
}

impl OpenMode {
    /// Whether this mode grants transfers in `direction`.
    pub fn allows(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Self::ReadWrite, _) | (Self::Read, Direction::Read) | (Self::Write, Direction::Write)
        )
    }
}

/// What kind of hardware sits behind a device name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    Usb {
        vid: u16,
        pid: u16,
        manufacturer: Option<String>,
        product: Option<String>,
        serial_number: Option<String>,
    },
    Bluetooth,
    Pci,
    Unknown,
}

impl From<serialport::SerialPortType> for DeviceKind {
    fn from(port_type: serialport::SerialPortType) -> Self {
        match port_type {
            serialport::SerialPortType::UsbPort(usb) => Self::Usb {
                vid: usb.vid,
                pid: usb.pid,
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
            },
            serialport::SerialPortType::BluetoothPort => Self::Bluetooth,
            serialport::SerialPortType::PciPort => Self::Pci,
            serialport::SerialPortType::Unknown => Self::Unknown,
        }
    }
}

/// A resolved, not yet opened, serial device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub kind: DeviceKind,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<serialport::SerialPortInfo> for DeviceInfo {
    fn from(info: serialport::SerialPortInfo) -> Self {
        Self::new(info.port_name, info.port_type.into())
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DeviceKind::Usb {
                vid,
                pid,
                manufacturer,
                product,
                ..
            } => {
                write!(f, "{} (USB {vid:04x}:{pid:04x}", self.name)?;
                if let Some(manufacturer) = manufacturer {
                    write!(f, " {manufacturer}")?;
                }
                if let Some(product) = product {
                    write!(f, " {product}")?;
                }
                f.write_str(")")
            }
            DeviceKind::Bluetooth => write!(f, "{} (Bluetooth)", self.name),
            DeviceKind::Pci => write!(f, "{} (PCI)", self.name),
            DeviceKind::Unknown => f.write_str(&self.name),
        }
    }
}

/// An open serial device handle.
///
/// Each setter is an independent call against the driver; nothing is
/// applied atomically. Transfers are single calls bounded by the timeout
/// last passed to [`set_timeout`](Self::set_timeout); the deadline loops
/// live in [`super::blocking`].
pub trait SerialPortAdapter: Send + fmt::Debug {
    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// The access mode the port was opened with.
    fn mode(&self) -> OpenMode;

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), PortError>;

    fn set_data_bits(&mut self, data_bits: DataBits) -> Result<(), PortError>;

    fn set_parity(&mut self, parity: Parity) -> Result<(), PortError>;

    fn set_stop_bits(&mut self, stop_bits: StopBits) -> Result<(), PortError>;

    fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<(), PortError>;

    /// Set how long a single read or write call may block.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes the driver accepted. A timeout is
    /// reported as an I/O error of kind `TimedOut`.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Release the OS-level resource.
    fn close(self) -> Result<(), PortError>
    where
        Self: Sized;
}

/// Looks up and opens serial devices.
pub trait SerialDeviceService {
    type Port: SerialPortAdapter;

    /// Look up a device by its platform-specific name.
    fn resolve(&self, name: &str) -> Result<DeviceInfo, PortError>;

    /// Acquire exclusive access to a resolved device.
    fn open(&self, device: &DeviceInfo, mode: OpenMode) -> Result<Self::Port, PortError>;

    /// Enumerate the devices currently present.
    fn list(&self) -> Result<Vec<DeviceInfo>, PortError>;
}
