//! Handshake control-line driver.
//!
//! The device only places its next byte on the line after the host pulses a
//! modem-control output low-high-low. The bitmap is always re-read before it
//! is written so other output bits keep whatever state the hardware has.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::port::{ModemLines, Transport};
use crate::error::{LinkError, Result};

/// Which modem-control output carries the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandshakeSignal {
    Dtr,
    Rts,
}

impl Default for HandshakeSignal {
    fn default() -> Self {
        HandshakeSignal::Dtr
    }
}

impl HandshakeSignal {
    pub fn bit(self) -> ModemLines {
        match self {
            HandshakeSignal::Dtr => ModemLines::DTR,
            HandshakeSignal::Rts => ModemLines::RTS,
        }
    }
}

/// Driver for the single handshake output
#[derive(Debug, Clone, Copy)]
pub struct ControlLine {
    signal: HandshakeSignal,
}

impl ControlLine {
    pub fn new(signal: HandshakeSignal) -> Self {
        Self { signal }
    }

    pub fn signal(&self) -> HandshakeSignal {
        self.signal
    }

    /// Whether the handshake output is currently asserted
    pub fn get_line_state<T: Transport>(&self, transport: &mut T) -> Result<bool> {
        let lines = transport.modem_lines().map_err(LinkError::HardwareQuery)?;
        Ok(lines.contains(self.signal.bit()))
    }

    /// Assert or release the handshake output, leaving every other bit alone
    pub fn set_line<T: Transport>(&self, transport: &mut T, asserted: bool) -> Result<()> {
        let mut lines = transport.modem_lines().map_err(LinkError::HardwareSet)?;
        lines.set(self.signal.bit(), asserted);
        transport.set_modem_lines(lines).map_err(LinkError::HardwareSet)
    }

    /// Assert, hold, release: asks the device for its next byte
    pub fn pulse_line<T: Transport>(&self, transport: &mut T, hold: Duration) -> Result<()> {
        self.set_line(transport, true)?;
        if !hold.is_zero() {
            thread::sleep(hold);
        }
        self.set_line(transport, false)?;
        trace!("{:?} pulsed", self.signal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::SimulatedDevice;

    #[test]
    fn test_set_line_preserves_other_bits() {
        let mut device = SimulatedDevice::new(Vec::new()).with_lines(ModemLines::RTS);
        let line = ControlLine::new(HandshakeSignal::Dtr);

        line.set_line(&mut device, true).unwrap();
        assert_eq!(device.lines(), ModemLines::RTS | ModemLines::DTR);
        assert!(line.get_line_state(&mut device).unwrap());

        line.set_line(&mut device, false).unwrap();
        assert_eq!(device.lines(), ModemLines::RTS);
        assert!(!line.get_line_state(&mut device).unwrap());
    }

    #[test]
    fn test_pulse_ends_deasserted() {
        let mut device = SimulatedDevice::new(vec![7]);
        let line = ControlLine::new(HandshakeSignal::Dtr);

        line.pulse_line(&mut device, Duration::ZERO).unwrap();
        assert_eq!(device.pulses(), 1);
        assert!(!line.get_line_state(&mut device).unwrap());
        assert_eq!(device.poll_byte().unwrap(), Some(7));
    }

    #[test]
    fn test_rts_signal() {
        let mut device = SimulatedDevice::new(Vec::new()).with_lines(ModemLines::DTR);
        let line = ControlLine::new(HandshakeSignal::Rts);

        line.set_line(&mut device, true).unwrap();
        assert_eq!(device.lines(), ModemLines::DTR | ModemLines::RTS);
    }

    #[test]
    fn test_query_failure() {
        let mut device = SimulatedDevice::new(Vec::new());
        device.fail_queries_after(0);
        let line = ControlLine::new(HandshakeSignal::Dtr);

        assert!(matches!(line.get_line_state(&mut device), Err(LinkError::HardwareQuery(_))));
        // A failed re-read inside set_line is reported as a set failure
        assert!(matches!(line.set_line(&mut device, true), Err(LinkError::HardwareSet(_))));
    }

    #[test]
    fn test_write_failure() {
        let mut device = SimulatedDevice::new(Vec::new());
        device.fail_sets_after(0);
        let line = ControlLine::new(HandshakeSignal::Dtr);

        assert!(matches!(line.pulse_line(&mut device, Duration::ZERO), Err(LinkError::HardwareSet(_))));
    }
}
