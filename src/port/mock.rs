//! Mock serial devices for testing.
//!
//! `MockSerialPort` simulates a port without hardware: queued read data,
//! a write log, optional loopback, a stalling transport and rejected line
//! settings. `MockDeviceService` hands out such ports by name and enforces
//! exclusive opening the way an OS driver does.

use super::error::PortError;
use super::traits::{
    DataBits, DeviceInfo, DeviceKind, FlowControl, OpenMode, Parity, SerialDeviceService,
    SerialPortAdapter, StopBits,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// A line setting as the driver received it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSetting {
    BaudRate(u32),
    DataBits(DataBits),
    Parity(Parity),
    StopBits(StopBits),
    FlowControl(FlowControl),
}

/// Inner state of the mock port, shared by every clone of it.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all accepted write calls.
    write_log: Vec<Vec<u8>>,
    /// Echo accepted writes into the read queue.
    loopback: bool,
    /// Bytes the transport still accepts before stalling; `None` is unlimited.
    write_capacity: Option<usize>,
    /// Largest number of bytes moved by one call.
    max_chunk: Option<usize>,
    /// Time each transfer call takes before it moves anything.
    latency: Option<Duration>,
    /// Error returned by the next transfer call.
    fail_next: Option<io::ErrorKind>,
    /// Settings the "driver" refuses.
    rejected: Vec<LineSetting>,
    /// Settings applied so far, in order.
    applied: Vec<LineSetting>,
    /// Configured timeout duration.
    timeout: Duration,
    /// Whether a handle to this device is currently open.
    open: bool,
    /// Refuse to open, as if permissions were missing.
    deny_access: bool,
    /// Number of times a handle was closed.
    close_count: usize,
}

/// Mock serial port implementation for testing.
///
/// Clones share state, so a test can keep one clone for inspection while a
/// session owns another.
///
/// # Example
/// ```
/// use serial_roundtrip::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Hello, World!");
///
/// let mut buffer = [0u8; 13];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello, World!");
///
/// port.write_bytes(b"Response").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"Response".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    mode: OpenMode,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: OpenMode::ReadWrite,
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
        }
    }

    /// Create a mock port that echoes every accepted write back.
    pub fn loopback(name: impl Into<String>) -> Self {
        let port = Self::new(name);
        port.state.lock().loopback = true;
        port
    }

    /// Return a handle to the same device with a different access mode.
    pub fn with_mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Get a copy of all data written to the port, one entry per call.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All accepted bytes, concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// Limit how many more bytes the transport accepts before stalling.
    pub fn set_write_capacity(&mut self, capacity: Option<usize>) {
        self.state.lock().write_capacity = capacity;
    }

    /// Limit how many bytes a single read or write call moves.
    pub fn set_max_chunk(&mut self, max_chunk: Option<usize>) {
        self.state.lock().max_chunk = max_chunk;
    }

    /// Make every read or write call take `latency`, like a slow line.
    ///
    /// A call whose timeout is shorter than the latency waits out the
    /// timeout and moves nothing.
    pub fn set_latency(&mut self, latency: Option<Duration>) {
        self.state.lock().latency = latency;
    }

    /// Make the next read or write call fail with an I/O error.
    pub fn fail_next_io(&mut self, kind: io::ErrorKind) {
        self.state.lock().fail_next = Some(kind);
    }

    /// Make the driver refuse `setting`.
    pub fn reject_setting(&mut self, setting: LineSetting) {
        self.state.lock().rejected.push(setting);
    }

    /// Refuse every open attempt with an access error.
    pub fn deny_access(&mut self, deny: bool) {
        self.state.lock().deny_access = deny;
    }

    /// Settings applied so far, in call order.
    pub fn applied_settings(&self) -> Vec<LineSetting> {
        self.state.lock().applied.clone()
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Timeout most recently set on the port.
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }

    fn apply(&mut self, setting: LineSetting) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.rejected.contains(&setting) {
            return Err(PortError::unsupported(format!("{setting:?}")));
        }
        state.applied.push(setting);
        Ok(())
    }

    /// Sleeps without holding the state lock.
    fn wait_latency(&self) -> Result<(), PortError> {
        let (latency, timeout) = {
            let state = self.state.lock();
            (state.latency, state.timeout)
        };
        match latency {
            Some(latency) if latency > timeout => {
                std::thread::sleep(timeout);
                Err(timed_out())
            }
            Some(latency) => {
                std::thread::sleep(latency);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn take_failure(state: &mut MockPortState) -> Result<(), PortError> {
        match state.fail_next.take() {
            Some(kind) => Err(PortError::Io(io::Error::new(kind, "simulated failure"))),
            None => Ok(()),
        }
    }
}

fn timed_out() -> PortError {
    PortError::Io(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out"))
}

impl SerialPortAdapter for MockSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), PortError> {
        self.apply(LineSetting::BaudRate(baud_rate))
    }

    fn set_data_bits(&mut self, data_bits: DataBits) -> Result<(), PortError> {
        self.apply(LineSetting::DataBits(data_bits))
    }

    fn set_parity(&mut self, parity: Parity) -> Result<(), PortError> {
        self.apply(LineSetting::Parity(parity))
    }

    fn set_stop_bits(&mut self, stop_bits: StopBits) -> Result<(), PortError> {
        self.apply(LineSetting::StopBits(stop_bits))
    }

    fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<(), PortError> {
        self.apply(LineSetting::FlowControl(flow_control))
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.wait_latency()?;
        let mut state = self.state.lock();
        Self::take_failure(&mut state)?;

        let mut n = data.len();
        if let Some(max_chunk) = state.max_chunk {
            n = n.min(max_chunk);
        }
        if let Some(capacity) = state.write_capacity {
            n = n.min(capacity);
            state.write_capacity = Some(capacity - n);
        }
        if n == 0 && !data.is_empty() {
            return Err(timed_out());
        }

        let accepted = &data[..n];
        state.write_log.push(accepted.to_vec());
        if state.loopback {
            state.read_queue.extend(accepted);
        }
        Ok(n)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.wait_latency()?;
        let mut state = self.state.lock();
        Self::take_failure(&mut state)?;

        let limit = state.max_chunk.unwrap_or(buffer.len()).min(buffer.len());
        let mut bytes_read = 0;
        while bytes_read < limit {
            match state.read_queue.pop_front() {
                Some(byte) => {
                    buffer[bytes_read] = byte;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 && !buffer.is_empty() {
            // Nothing arrived within the timeout
            Err(timed_out())
        } else {
            Ok(bytes_read)
        }
    }

    fn close(self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.open = false;
        state.close_count += 1;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// Device service over a fixed set of mock ports.
#[derive(Debug, Default)]
pub struct MockDeviceService {
    devices: Mutex<BTreeMap<String, MockSerialPort>>,
}

impl MockDeviceService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device; the service keeps a clone sharing its state.
    pub fn with_device(self, port: MockSerialPort) -> Self {
        self.add_device(port);
        self
    }

    pub fn add_device(&self, port: MockSerialPort) {
        self.devices.lock().insert(port.name.clone(), port);
    }

    /// Simulate the device being unplugged.
    pub fn remove_device(&self, name: &str) -> Option<MockSerialPort> {
        self.devices.lock().remove(name)
    }
}

impl SerialDeviceService for MockDeviceService {
    type Port = MockSerialPort;

    fn resolve(&self, name: &str) -> Result<DeviceInfo, PortError> {
        if name.trim().is_empty() {
            return Err(PortError::invalid_input("empty port name"));
        }
        if self.devices.lock().contains_key(name) {
            Ok(DeviceInfo::new(name, DeviceKind::Unknown))
        } else {
            Err(PortError::not_found(name))
        }
    }

    fn open(&self, device: &DeviceInfo, mode: OpenMode) -> Result<Self::Port, PortError> {
        let devices = self.devices.lock();
        let port = devices
            .get(device.name())
            .ok_or_else(|| PortError::Unavailable(format!("{}: device vanished", device.name())))?;

        let mut state = port.state.lock();
        if state.deny_access {
            return Err(PortError::AccessDenied(device.name().to_string()));
        }
        if state.open {
            return Err(PortError::Unavailable(format!("{}: device busy", device.name())));
        }
        state.open = true;
        drop(state);

        Ok(port.clone().with_mode(mode))
    }

    fn list(&self) -> Result<Vec<DeviceInfo>, PortError> {
        Ok(self
            .devices
            .lock()
            .keys()
            .map(|name| DeviceInfo::new(name.clone(), DeviceKind::Unknown))
            .collect())
    }
}
