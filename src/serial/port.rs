//! Serial transport for the punch/reader link
//!
//! Wraps a `serialport` TTY configured raw 8N1 without flow control. The
//! handshake needs direct access to the modem-control bitmap, which is
//! read and written through `TIOCMGET` / `TIOCMSET` on the native descriptor.

use std::io;
use std::thread;
use std::time::Duration;

use bitflags::bitflags;
use tracing::{debug, info, warn};

use crate::error::{LinkError, Result};

/// Rates the line is known to accept. Anything else is passed through to
/// the driver unless `strict_baud` is set.
pub const SUPPORTED_BAUD_RATES: &[u32] = &[600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

bitflags! {
    /// Modem-control bitmap. Bit layout matches `TIOCM_*` in `<sys/ioctl.h>`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModemLines: u32 {
        const LE  = 0x001;
        const DTR = 0x002;
        const RTS = 0x004;
        const ST  = 0x008;
        const SR  = 0x010;
        const CTS = 0x020;
        const CAR = 0x040;
        const RNG = 0x080;
        const DSR = 0x100;
    }
}

/// Byte-level access to an open serial line.
pub trait Transport {
    /// Non-blocking single byte read. `Ok(None)` means nothing is waiting yet.
    fn poll_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write all bytes to the line.
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Current modem-control bitmap.
    fn modem_lines(&mut self) -> io::Result<ModemLines>;

    /// Replace the modem-control bitmap.
    fn set_modem_lines(&mut self, lines: ModemLines) -> io::Result<()>;

    /// Drop anything queued in the driver in both directions.
    fn discard_buffers(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).poll_byte()
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).send(data)
    }

    fn modem_lines(&mut self) -> io::Result<ModemLines> {
        (**self).modem_lines()
    }

    fn set_modem_lines(&mut self, lines: ModemLines) -> io::Result<()> {
        (**self).set_modem_lines(lines)
    }

    fn discard_buffers(&mut self) -> io::Result<()> {
        (**self).discard_buffers()
    }
}

/// Validate a configured baud rate.
///
/// Unsupported rates are handed to the driver as-is (it may keep the
/// previous rate) unless `strict` is set.
pub fn check_baud(baud: u32, strict: bool) -> Result<u32> {
    if SUPPORTED_BAUD_RATES.contains(&baud) {
        return Ok(baud);
    }
    if strict {
        return Err(LinkError::UnsupportedBaud(baud));
    }
    warn!("Baud rate {} is not in the supported set, the driver may keep its previous rate", baud);
    Ok(baud)
}

/// Let the line settle after opening: wait, discard queued bytes, wait again.
pub fn settle<T: Transport>(transport: &mut T, path: &str, delay: Duration) -> Result<()> {
    thread::sleep(delay);
    transport.discard_buffers().map_err(|source| LinkError::Configuration {
        path: path.to_string(),
        source,
    })?;
    thread::sleep(delay);
    Ok(())
}

#[cfg(unix)]
pub use native::{open_transport, SerialTransport};

#[cfg(unix)]
mod native {
    use std::io::{self, Read, Write};
    use std::os::unix::io::AsRawFd;
    use std::time::Duration;

    use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits, TTYPort};

    use super::*;

    /// An open, configured serial line. Closed on drop.
    pub struct SerialTransport {
        port: TTYPort,
    }

    /// Open `path` raw 8N1 with no software or hardware flow control.
    ///
    /// A zero `timeout` gives return-immediately reads, which is what the
    /// handshake loop expects.
    pub fn open_transport(path: &str, baud: u32, timeout: Duration) -> Result<SerialTransport> {
        let port = serialport::new(path, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open_native()
            .map_err(|e| LinkError::Configuration {
                path: path.to_string(),
                source: e.into(),
            })?;

        match port.baud_rate() {
            Ok(actual) if actual != baud => {
                warn!("Requested {} baud on {}, line reports {}", baud, path, actual)
            }
            Ok(actual) => debug!("{} running at {} baud", path, actual),
            Err(e) => debug!("Could not read back baud rate: {}", e),
        }
        info!("Opened serial port {}", path);

        Ok(SerialTransport { port })
    }

    impl Transport for SerialTransport {
        fn poll_byte(&mut self) -> io::Result<Option<u8>> {
            let mut buf = [0u8; 1];
            match self.port.read(&mut buf) {
                Ok(0) => Ok(None),
                Ok(_) => Ok(Some(buf[0])),
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        }

        fn send(&mut self, data: &[u8]) -> io::Result<()> {
            self.port.write_all(data)
        }

        fn modem_lines(&mut self) -> io::Result<ModemLines> {
            let mut bits: libc::c_int = 0;
            let rc = unsafe {
                libc::ioctl(self.port.as_raw_fd(), libc::TIOCMGET, &mut bits as *mut libc::c_int)
            };
            if rc == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(ModemLines::from_bits_retain(bits as u32))
        }

        fn set_modem_lines(&mut self, lines: ModemLines) -> io::Result<()> {
            let bits = lines.bits() as libc::c_int;
            let rc = unsafe {
                libc::ioctl(self.port.as_raw_fd(), libc::TIOCMSET, &bits as *const libc::c_int)
            };
            if rc == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }

        fn discard_buffers(&mut self) -> io::Result<()> {
            self.port.clear(ClearBuffer::All).map_err(io::Error::from)
        }
    }
}
