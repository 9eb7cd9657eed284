//! Exchanges against a real serial device.
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0   # or COM3
//! export TEST_BAUD=9600           # optional
//! export TEST_LOOPBACK=1          # if TX and RX are wired together
//! cargo test --features hardware-tests -- --ignored
//! ```

use super::utils::{print_available_ports, skip_without_hardware};
use serial_roundtrip::exchange::DEFAULT_PAYLOAD;
use serial_roundtrip::{
    run_exchange, OpenMode, PortSession, SerialDeviceService, SystemSerialService, Timeout,
};

#[test]
#[ignore]
fn test_real_port_resolves_and_reopens() {
    let Some(config) = skip_without_hardware() else {
        return;
    };
    print_available_ports();

    let service = SystemSerialService::new();
    let device = service
        .resolve(&config.port_name)
        .expect("TEST_PORT should resolve");
    println!("Resolved {device}");

    // Close must free the device for the next open
    for _ in 0..2 {
        let session = PortSession::open(&service, device.clone(), OpenMode::ReadWrite)
            .expect("Failed to open port");
        session.close().expect("Failed to close port");
    }
}

#[test]
#[ignore]
fn test_real_port_configure_and_write() {
    let Some(config) = skip_without_hardware() else {
        return;
    };

    let service = SystemSerialService::new();
    let settings = config.exchange_settings();
    let mut session = PortSession::open_by_name(&service, &config.port_name, OpenMode::ReadWrite)
        .expect("Failed to open port");

    session.configure(&settings.line).expect("Failed to configure");
    let sent = session
        .write(&DEFAULT_PAYLOAD, Timeout::from_millis(1000))
        .expect("Write failed");
    println!("Sent {}/{} bytes", sent.completed, sent.requested);
    assert!(sent.completed <= sent.requested);

    session.close().expect("Failed to close port");
}

#[test]
#[ignore]
fn test_real_port_loopback_exchange() {
    let Some(config) = skip_without_hardware() else {
        return;
    };
    if !config.loopback_enabled {
        println!("Skipping loopback test: TEST_LOOPBACK not set to 1");
        return;
    }

    let service = SystemSerialService::new();
    let settings = config.exchange_settings();
    let mut out = Vec::new();

    let report = run_exchange(&service, &settings, &mut out).expect("Exchange failed");
    print!("{}", String::from_utf8_lossy(&out));

    assert!(report.sent.is_complete());
    assert_eq!(report.received.completed, report.sent.completed);
    assert!(report.echo_matches, "Loopback data should match written data");
}
