//! Port session: one open device driven through configure, write and read.
//!
//! The session owns the opened handle. Closing consumes the session, and
//! dropping it without closing releases the handle too, so every exit path
//! frees the device exactly once.

use crate::error::{check, SessionError, Stage};
use crate::port::{
    blocking_read, blocking_write, DeviceInfo, LineConfig, OpenMode, PortError,
    SerialDeviceService, SerialPortAdapter, Timeout, TransferCount,
};
use tracing::{debug, info, warn};

pub struct PortSession<P: SerialPortAdapter> {
    /// `None` only once the handle has been released.
    port: Option<P>,
    device: DeviceInfo,
}

impl<P: SerialPortAdapter> PortSession<P> {
    /// Open `device` through `service`.
    pub fn open<S>(service: &S, device: DeviceInfo, mode: OpenMode) -> Result<Self, SessionError>
    where
        S: SerialDeviceService<Port = P> + ?Sized,
    {
        let port = service.open(&device, mode).map_err(check(Stage::Open))?;
        info!(port = device.name(), ?mode, "port opened");
        Ok(Self {
            port: Some(port),
            device,
        })
    }

    /// Resolve `name` and open it in one step.
    pub fn open_by_name<S>(service: &S, name: &str, mode: OpenMode) -> Result<Self, SessionError>
    where
        S: SerialDeviceService<Port = P> + ?Sized,
    {
        let device = service.resolve(name).map_err(check(Stage::Resolve))?;
        Self::open(service, device, mode)
    }

    /// Name of the open device.
    pub fn name(&self) -> &str {
        self.device.name()
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    fn handle(&mut self, stage: Stage) -> Result<&mut P, SessionError> {
        self.port
            .as_mut()
            .ok_or_else(|| SessionError::invalid_argument(stage, "port handle already released"))
    }

    fn apply(
        &mut self,
        stage: Stage,
        set: impl FnOnce(&mut P) -> Result<(), PortError>,
    ) -> Result<(), SessionError> {
        let port = self.handle(stage)?;
        set(port).map_err(check(stage))
    }

    /// Apply the five line settings in order, stopping at the first one the
    /// driver rejects. Settings applied before the failure stay applied.
    pub fn configure(&mut self, line: &LineConfig) -> Result<(), SessionError> {
        if line.baud_rate == 0 {
            return Err(SessionError::invalid_argument(
                Stage::SetBaudRate,
                "baud rate must be greater than zero",
            ));
        }

        debug!(port = self.name(), baud_rate = line.baud_rate, "setting baud rate");
        self.apply(Stage::SetBaudRate, |p| p.set_baud_rate(line.baud_rate))?;

        debug!(port = self.name(), data_bits = line.data_bits.bits(), "setting data bits");
        self.apply(Stage::SetDataBits, |p| p.set_data_bits(line.data_bits))?;

        debug!(port = self.name(), parity = ?line.parity, "setting parity");
        self.apply(Stage::SetParity, |p| p.set_parity(line.parity))?;

        debug!(port = self.name(), stop_bits = line.stop_bits.count(), "setting stop bits");
        self.apply(Stage::SetStopBits, |p| p.set_stop_bits(line.stop_bits))?;

        debug!(port = self.name(), flow_control = ?line.flow_control, "setting flow control");
        self.apply(Stage::SetFlowControl, |p| p.set_flow_control(line.flow_control))?;

        info!(port = self.name(), line = %line, "line configured");
        Ok(())
    }

    /// Send `data`, blocking up to `timeout`. A short count means the
    /// timeout expired first.
    pub fn write(&mut self, data: &[u8], timeout: Timeout) -> Result<TransferCount, SessionError> {
        let port = self.handle(Stage::Write)?;
        let completed = blocking_write(port, data, timeout).map_err(check(Stage::Write))?;

        let count = TransferCount {
            requested: data.len(),
            completed,
        };
        if count.is_complete() {
            info!(port = self.name(), bytes = completed, "write complete");
        } else {
            warn!(
                port = self.name(),
                completed,
                requested = data.len(),
                timeout_ms = timeout.as_millis(),
                "write timed out"
            );
        }
        Ok(count)
    }

    /// Receive up to `max_len` bytes, blocking up to `timeout`.
    ///
    /// The returned buffer holds exactly the received bytes.
    pub fn read(
        &mut self,
        max_len: usize,
        timeout: Timeout,
    ) -> Result<(TransferCount, Vec<u8>), SessionError> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(max_len)
            .map_err(|_| SessionError::OutOfMemory { stage: Stage::Read })?;
        buffer.resize(max_len, 0);

        let port = self.handle(Stage::Read)?;
        let completed = blocking_read(port, &mut buffer, timeout).map_err(check(Stage::Read))?;
        buffer.truncate(completed);

        let count = TransferCount {
            requested: max_len,
            completed,
        };
        if count.is_complete() {
            info!(port = self.name(), bytes = completed, "read complete");
        } else {
            debug!(
                port = self.name(),
                completed,
                requested = max_len,
                timeout_ms = timeout.as_millis(),
                "read timed out"
            );
        }
        Ok((count, buffer))
    }

    /// Release the device.
    pub fn close(mut self) -> Result<(), SessionError> {
        match self.port.take() {
            Some(port) => {
                port.close().map_err(check(Stage::Close))?;
                info!(port = self.name(), "port closed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<P: SerialPortAdapter> Drop for PortSession<P> {
    fn drop(&mut self) {
        if let Some(port) = self.port.take() {
            debug!(port = self.device.name(), "releasing port on drop");
            if let Err(e) = port.close() {
                warn!(port = self.device.name(), error = %e, "failed to release port");
            }
        }
    }
}

impl<P: SerialPortAdapter> std::fmt::Debug for PortSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortSession")
            .field("device", &self.device)
            .field("open", &self.port.is_some())
            .finish()
    }
}
