//! Tape punch: copy a file to the line byte by byte.
//!
//! The punch accepts bytes as fast as the line delivers them, so there is no
//! handshake on this path.

use std::io::{BufReader, Read};

use tracing::trace;

use crate::error::{LinkError, Result};
use crate::serial::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PunchSummary {
    pub bytes_sent: u64,
}

/// Send every byte of `source` to the line in order
pub fn transmit<R: Read, T: Transport>(source: R, transport: &mut T) -> Result<PunchSummary> {
    let mut bytes_sent = 0u64;

    for byte in BufReader::new(source).bytes() {
        let byte = byte.map_err(LinkError::InputRead)?;
        transport.send(&[byte]).map_err(LinkError::TransportWrite)?;
        bytes_sent += 1;
        trace!("sent {:#04x}", byte);
    }

    Ok(PunchSummary { bytes_sent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::SimulatedDevice;
    use std::io;

    #[test]
    fn test_copies_all_bytes_in_order() {
        let mut device = SimulatedDevice::new(Vec::new());
        let data: Vec<u8> = (0..=255).collect();

        let summary = transmit(&data[..], &mut device).unwrap();
        assert_eq!(summary.bytes_sent, 256);
        assert_eq!(device.sent(), &data[..]);
        // No handshake on this path
        assert_eq!(device.pulses(), 0);
    }

    #[test]
    fn test_empty_source() {
        let mut device = SimulatedDevice::new(Vec::new());
        let summary = transmit(io::empty(), &mut device).unwrap();
        assert_eq!(summary.bytes_sent, 0);
    }

    #[test]
    fn test_line_write_failure() {
        let mut device = SimulatedDevice::new(Vec::new());
        device.fail_sends_after(2);

        let result = transmit(&b"abcd"[..], &mut device);
        assert!(matches!(result, Err(LinkError::TransportWrite(_))));
        assert_eq!(device.sent(), b"ab");
    }

    struct BrokenSource;

    impl Read for BrokenSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "bad sector"))
        }
    }

    #[test]
    fn test_source_read_failure() {
        let mut device = SimulatedDevice::new(Vec::new());
        assert!(matches!(transmit(BrokenSource, &mut device), Err(LinkError::InputRead(_))));
    }
}
