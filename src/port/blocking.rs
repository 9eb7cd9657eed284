//! Deadline-bounded transfers.
//!
//! A single driver call may move fewer bytes than asked for. These helpers
//! keep calling until the whole buffer is moved or the deadline passes, and
//! report a short count on expiry instead of an error.

use super::error::PortError;
use super::traits::{Direction, SerialPortAdapter};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::trace;

/// Per-call wait used while an unbounded transfer is in progress.
const UNBOUNDED_POLL: Duration = Duration::from_secs(1);

/// Time budget for one blocking transfer, in milliseconds.
///
/// Zero means no limit: the call blocks until the transfer completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeout(u64);

impl Timeout {
    pub const UNBOUNDED: Self = Self(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    pub fn is_unbounded(self) -> bool {
        self.0 == 0
    }

    fn deadline_from(self, start: Instant) -> Option<Instant> {
        if self.is_unbounded() {
            None
        } else {
            Some(start + Duration::from_millis(self.0))
        }
    }
}

/// How much of a requested transfer completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCount {
    pub requested: usize,
    pub completed: usize,
}

impl TransferCount {
    pub fn is_complete(&self) -> bool {
        self.completed == self.requested
    }
}

/// Time left before `deadline`, or `None` once it has passed.
fn next_wait(deadline: Option<Instant>) -> Option<Duration> {
    match deadline {
        None => Some(UNBOUNDED_POLL),
        Some(deadline) => {
            let left = deadline.saturating_duration_since(Instant::now());
            (!left.is_zero()).then_some(left)
        }
    }
}

/// Write all of `data`, or as much as the transport accepts before the
/// timeout expires.
pub fn blocking_write<P>(port: &mut P, data: &[u8], timeout: Timeout) -> Result<usize, PortError>
where
    P: SerialPortAdapter + ?Sized,
{
    if !port.mode().allows(Direction::Write) {
        return Err(PortError::NotOpenFor(Direction::Write));
    }

    let deadline = timeout.deadline_from(Instant::now());
    let mut written = 0;

    while written < data.len() {
        let Some(wait) = next_wait(deadline) else {
            break;
        };
        port.set_timeout(wait)?;

        match port.write_bytes(&data[written..]) {
            Ok(n) => {
                trace!(port = port.name(), n, "write chunk");
                written += n.min(data.len() - written);
            }
            Err(e) if e.is_interrupted() => continue,
            Err(e) if e.is_timeout() => {
                if deadline.is_some() {
                    break;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(written)
}

/// Fill `buffer`, or as much of it as arrives before the timeout expires.
pub fn blocking_read<P>(port: &mut P, buffer: &mut [u8], timeout: Timeout) -> Result<usize, PortError>
where
    P: SerialPortAdapter + ?Sized,
{
    if !port.mode().allows(Direction::Read) {
        return Err(PortError::NotOpenFor(Direction::Read));
    }

    let deadline = timeout.deadline_from(Instant::now());
    let mut filled = 0;

    while filled < buffer.len() {
        let Some(wait) = next_wait(deadline) else {
            break;
        };
        port.set_timeout(wait)?;

        match port.read_bytes(&mut buffer[filled..]) {
            Ok(n) => {
                trace!(port = port.name(), n, "read chunk");
                filled += n.min(buffer.len() - filled);
            }
            Err(e) if e.is_interrupted() => continue,
            Err(e) if e.is_timeout() => {
                if deadline.is_some() {
                    break;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MockSerialPort, OpenMode};

    #[test]
    fn test_timeout_zero_is_unbounded() {
        assert!(Timeout::UNBOUNDED.is_unbounded());
        assert_eq!(Timeout::default(), Timeout::UNBOUNDED);
        assert_eq!(Timeout::from_millis(1000).as_millis(), 1000);
        assert!(Timeout::from_millis(1).deadline_from(Instant::now()).is_some());
        assert!(Timeout::UNBOUNDED.deadline_from(Instant::now()).is_none());
    }

    #[test]
    fn test_write_completes_on_healthy_transport() {
        let mut port = MockSerialPort::new("MOCK0");
        let n = blocking_write(&mut port, b"Hello", Timeout::from_millis(100)).unwrap();
        assert_eq!(n, 5);
        assert_eq!(port.written_bytes(), b"Hello");
    }

    #[test]
    fn test_write_short_count_when_transport_stalls() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_write_capacity(Some(3));

        let n = blocking_write(&mut port, b"Hello", Timeout::from_millis(100)).unwrap();
        assert_eq!(n, 3);
        assert_eq!(port.written_bytes(), b"Hel");
    }

    #[test]
    fn test_write_in_chunks() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_max_chunk(Some(2));

        let n = blocking_write(&mut port, b"Hello", Timeout::UNBOUNDED).unwrap();
        assert_eq!(n, 5);
        assert_eq!(port.get_write_log().len(), 3);
    }

    #[test]
    fn test_read_returns_what_arrived_before_timeout() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"abc");

        let mut buffer = [0u8; 16];
        let n = blocking_read(&mut port, &mut buffer, Timeout::from_millis(100)).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buffer[..n], b"abc");
    }

    #[test]
    fn test_read_stops_when_buffer_full() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello, World!");

        let mut buffer = [0u8; 5];
        let n = blocking_read(&mut port, &mut buffer, Timeout::UNBOUNDED).unwrap();
        assert_eq!(n, 5);
        assert_eq!(port.available_bytes(), 8);
    }

    #[test]
    fn test_direction_checked_against_mode() {
        let mut port = MockSerialPort::new("MOCK0").with_mode(OpenMode::Read);
        let result = blocking_write(&mut port, b"x", Timeout::from_millis(10));
        assert!(matches!(result, Err(PortError::NotOpenFor(Direction::Write))));

        let mut port = MockSerialPort::new("MOCK0").with_mode(OpenMode::Write);
        let mut buffer = [0u8; 1];
        let result = blocking_read(&mut port, &mut buffer, Timeout::from_millis(10));
        assert!(matches!(result, Err(PortError::NotOpenFor(Direction::Read))));
    }

    #[test]
    fn test_hard_errors_propagate() {
        let mut port = MockSerialPort::new("MOCK0");
        port.fail_next_io(std::io::ErrorKind::BrokenPipe);

        let result = blocking_write(&mut port, b"x", Timeout::from_millis(10));
        assert!(matches!(result, Err(PortError::Io(_))));
    }

    #[test]
    fn test_slow_write_stops_at_deadline() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_latency(Some(Duration::from_millis(100)));
        port.set_max_chunk(Some(1));

        let start = Instant::now();
        let n = blocking_write(&mut port, &[0u8; 16], Timeout::from_millis(350)).unwrap();
        let elapsed = start.elapsed();

        assert!(n > 0 && n < 16, "expected a short count, got {n}");
        assert_eq!(port.written_bytes().len(), n);
        assert!(elapsed >= Duration::from_millis(350), "returned early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(1000), "overran deadline: {elapsed:?}");
    }

    #[test]
    fn test_slow_read_stops_at_deadline() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(&[0x55; 16]);
        port.set_latency(Some(Duration::from_millis(100)));
        port.set_max_chunk(Some(1));

        let mut buffer = [0u8; 16];
        let start = Instant::now();
        let n = blocking_read(&mut port, &mut buffer, Timeout::from_millis(350)).unwrap();
        let elapsed = start.elapsed();

        assert!(n > 0 && n < 16, "expected a short count, got {n}");
        assert_eq!(port.available_bytes(), 16 - n);
        assert!(elapsed >= Duration::from_millis(350), "returned early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(1000), "overran deadline: {elapsed:?}");
    }

    #[test]
    fn test_latency_longer_than_timeout_moves_nothing() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_latency(Some(Duration::from_millis(200)));

        let n = blocking_write(&mut port, b"Hello", Timeout::from_millis(50)).unwrap();
        assert_eq!(n, 0);
        assert!(port.written_bytes().is_empty());
    }

    #[test]
    fn test_empty_transfers() {
        let mut port = MockSerialPort::new("MOCK0");
        assert_eq!(blocking_write(&mut port, b"", Timeout::UNBOUNDED).unwrap(), 0);

        let mut buffer = [0u8; 0];
        assert_eq!(blocking_read(&mut port, &mut buffer, Timeout::UNBOUNDED).unwrap(), 0);
    }
}
