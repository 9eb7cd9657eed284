//! Shared test utilities.
//!
//! Builders for mock device services and exchange settings.

#![allow(dead_code)]

use serial_roundtrip::exchange::ExchangeSettings;
use serial_roundtrip::port::{MockDeviceService, MockSerialPort};

/// Name of the mock device used across tests.
pub const DEVICE: &str = "X";

/// A service holding one loopback device. The returned port shares state
/// with the one inside the service, for inspection.
pub fn loopback_service() -> (MockDeviceService, MockSerialPort) {
    let port = MockSerialPort::loopback(DEVICE);
    let service = MockDeviceService::new().with_device(port.clone());
    (service, port)
}

/// A service holding one device with nothing wired to its receive line.
pub fn silent_service() -> (MockDeviceService, MockSerialPort) {
    let port = MockSerialPort::new(DEVICE);
    let service = MockDeviceService::new().with_device(port.clone());
    (service, port)
}

/// Default exchange settings aimed at the mock device.
pub fn settings() -> ExchangeSettings {
    ExchangeSettings {
        port: DEVICE.to_string(),
        ..ExchangeSettings::default()
    }
}

/// Run an exchange and capture its progress lines.
pub fn run_captured(
    service: &MockDeviceService,
    settings: &ExchangeSettings,
) -> (
    Result<serial_roundtrip::ExchangeReport, serial_roundtrip::SessionError>,
    String,
) {
    let mut out = Vec::new();
    let result = serial_roundtrip::run_exchange(service, settings, &mut out);
    (result, String::from_utf8_lossy(&out).into_owned())
}
