//! Environment helpers for hardware tests.

#![allow(dead_code)]

use serial_roundtrip::exchange::ExchangeSettings;
use serial_roundtrip::{DeviceInfo, SerialDeviceService, SystemSerialService};
use std::env;

/// Test port configuration from environment.
pub struct TestPortConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub loopback_enabled: bool,
}

impl TestPortConfig {
    /// Read `TEST_PORT`, `TEST_BAUD` (default 9600) and `TEST_LOOPBACK`.
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("TEST_PORT").ok()?;
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9600);
        let loopback_enabled = env::var("TEST_LOOPBACK").ok().as_deref() == Some("1");

        Some(TestPortConfig {
            port_name,
            baud_rate,
            loopback_enabled,
        })
    }

    /// Exchange settings for this port, otherwise defaults.
    pub fn exchange_settings(&self) -> ExchangeSettings {
        let mut settings = ExchangeSettings {
            port: self.port_name.clone(),
            ..ExchangeSettings::default()
        };
        settings.line.baud_rate = self.baud_rate;
        settings
    }
}

/// Skip test if hardware is not available.
pub fn skip_without_hardware() -> Option<TestPortConfig> {
    let config = TestPortConfig::from_env();
    if config.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    config
}

/// Print the ports the system reports, for debugging.
pub fn print_available_ports() {
    let ports: Vec<DeviceInfo> = SystemSerialService::new().list().unwrap_or_default();

    if ports.is_empty() {
        println!("No serial ports detected on this system");
        return;
    }

    println!("Available serial ports ({}):", ports.len());
    for (idx, port) in ports.iter().enumerate() {
        println!("  {}. {}", idx + 1, port);
    }
}
