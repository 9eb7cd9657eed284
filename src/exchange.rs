//! The send-and-receive exchange.
//!
//! Resolves and opens one device, configures the line, writes a payload,
//! reads back whatever arrives within the timeout, and closes the device.
//! Progress lines go to the supplied writer.

use crate::error::{check, SessionError, Stage};
use crate::port::{LineConfig, OpenMode, SerialDeviceService, Timeout, TransferCount};
use crate::session::PortSession;
use serde::Serialize;
use std::io::Write;

/// Device used when nothing else is configured.
pub const DEFAULT_PORT: &str = "/dev/tty.usbserial-14220";

/// Payload used when nothing else is configured. Byte 6 is zero.
pub const DEFAULT_PAYLOAD: [u8; 16] = [
    0x42, 0x6E, 0x43, 0x50, 0x02, 0x01, 0x00, 0x04, 0x32, 0x02, 0x08, 0x01, 0x34, 0xC7, 0x4D, 0xBA,
];

pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Receive buffer size.
pub const DEFAULT_READ_LEN: usize = 1024;

/// Everything one exchange needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSettings {
    pub port: String,
    pub line: LineConfig,
    pub payload: Vec<u8>,
    pub timeout: Timeout,
    pub read_len: usize,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            line: LineConfig::default(),
            payload: DEFAULT_PAYLOAD.to_vec(),
            timeout: Timeout::from_millis(DEFAULT_TIMEOUT_MS),
            read_len: DEFAULT_READ_LEN,
        }
    }
}

/// Outcome of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeReport {
    pub port: String,
    pub line: LineConfig,
    pub sent: TransferCount,
    pub received: TransferCount,
    pub received_bytes: Vec<u8>,
    /// Received bytes equal the bytes that were sent.
    pub echo_matches: bool,
}

/// Space-separated uppercase hex, e.g. `42 6E 00`.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

macro_rules! say {
    ($out:expr, $($arg:tt)*) => {
        writeln!($out, $($arg)*).map_err(|e| SessionError::Failed {
            stage: Stage::Report,
            message: e.to_string(),
        })
    };
}

/// Run the exchange against `service`, printing progress to `out`.
pub fn run_exchange<S, W>(
    service: &S,
    settings: &ExchangeSettings,
    out: &mut W,
) -> Result<ExchangeReport, SessionError>
where
    S: SerialDeviceService + ?Sized,
    W: Write + ?Sized,
{
    let device = service
        .resolve(&settings.port)
        .map_err(check(Stage::Resolve))?;

    say!(out, "Opening port.")?;
    let mut session = PortSession::open(service, device, OpenMode::ReadWrite)?;

    say!(out, "Setting port to {}.", settings.line)?;
    session.configure(&settings.line)?;

    let payload = settings.payload.as_slice();
    say!(out, "Sending {} bytes: {}", payload.len(), format_hex(payload))?;
    let sent = session.write(payload, settings.timeout)?;
    if sent.is_complete() {
        say!(out, "Sent {} bytes successfully.", sent.requested)?;
    } else {
        say!(out, "Timed out, {}/{} bytes sent.", sent.completed, sent.requested)?;
    }

    say!(out, "Receiving {} bytes on port {}.", settings.read_len, session.name())?;
    let (received, received_bytes) = session.read(settings.read_len, settings.timeout)?;
    if received.is_complete() {
        say!(out, "Received {} bytes successfully.", received.requested)?;
    } else {
        say!(out, "Timed out, {}/{} bytes received.", received.completed, received.requested)?;
    }

    let echo_matches = received_bytes.as_slice() == &payload[..sent.completed];
    if echo_matches {
        say!(out, "Received data matches sent data.")?;
    } else if received_bytes.is_empty() {
        say!(out, "Received data differs from sent data.")?;
    } else {
        say!(out, "Received data differs from sent data: {}", format_hex(&received_bytes))?;
    }

    let port = session.name().to_string();
    session.close()?;

    Ok(ExchangeReport {
        port,
        line: settings.line,
        sent,
        received,
        received_bytes,
        echo_matches,
    })
}
