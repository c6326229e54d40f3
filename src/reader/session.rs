//! Handshake read loop
//!
//! Pulls bytes from the reader one at a time: pulse the handshake line,
//! poll for the byte it produces, hand the result to the session policy,
//! repeat. Runs on the calling thread; the poll interval sleep is the only
//! yield point.

use std::io::Write;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::policy::{ReadSession, SessionEvent, SessionLimits, StopReason, Verdict};
use crate::error::{LinkError, Result};
use crate::serial::{ControlLine, HandshakeSignal, Transport};

/// Timing and watchdog settings for one read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSettings {
    pub signal: HandshakeSignal,
    /// How long the line is held asserted during a pulse
    pub pulse_hold: Duration,
    /// Quiet time with the line released before the first pulse
    pub release_delay: Duration,
    /// Back-off between empty polls
    pub poll_interval: Duration,
    pub limits: SessionLimits,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            signal: HandshakeSignal::Dtr,
            pulse_hold: Duration::from_micros(1),
            release_delay: Duration::from_millis(10),
            poll_interval: Duration::from_millis(1),
            limits: SessionLimits::default(),
        }
    }
}

/// What a finished session did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSummary {
    /// Bytes written to the output, zeros included
    pub bytes_written: u64,
    pub zero_bytes: u64,
    pub empty_polls: u64,
    pub stop: StopReason,
}

impl ReadSummary {
    pub fn payload_bytes(&self) -> u64 {
        self.bytes_written - self.zero_bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Idle,
    Priming,
    Polling,
    Stopped(StopReason),
}

/// Owns the transport and output for the length of one read
pub struct HandshakeReader<T: Transport, W: Write> {
    transport: T,
    output: W,
    line: ControlLine,
    settings: ReaderSettings,
}

impl<T: Transport, W: Write> HandshakeReader<T, W> {
    pub fn new(transport: T, output: W, settings: ReaderSettings) -> Self {
        Self {
            transport,
            output,
            line: ControlLine::new(settings.signal),
            settings,
        }
    }

    /// Run the session to completion.
    ///
    /// The handshake line is released on every exit path. When the session
    /// already failed, a failure to release is logged and the original error
    /// is returned.
    pub fn run(&mut self) -> Result<ReadSummary> {
        let outcome = self.drive();
        let released = self.line.set_line(&mut self.transport, false);

        match (outcome, released) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(release_err)) => {
                warn!("Could not release handshake line: {}", release_err);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }

    /// Give back the transport and output
    pub fn into_inner(self) -> (T, W) {
        (self.transport, self.output)
    }

    fn drive(&mut self) -> Result<ReadSummary> {
        let mut state = LoopState::Idle;
        let mut session = ReadSession::new(self.settings.limits);
        let mut bytes_written = 0u64;
        let mut zero_bytes = 0u64;
        let mut empty_polls = 0u64;

        loop {
            state = match state {
                LoopState::Idle => {
                    self.line.set_line(&mut self.transport, false)?;
                    if !self.settings.release_delay.is_zero() {
                        thread::sleep(self.settings.release_delay);
                    }
                    LoopState::Priming
                }
                LoopState::Priming => {
                    self.pulse()?;
                    info!("Wrote start reader command");
                    LoopState::Polling
                }
                LoopState::Polling => {
                    let polled = self.transport.poll_byte().map_err(LinkError::TransportRead)?;
                    match polled {
                        None => {
                            empty_polls += 1;
                            let (next, verdict) = session.advance(SessionEvent::PollTimedOut);
                            session = next;
                            match verdict {
                                Verdict::Continue => {
                                    if !self.settings.poll_interval.is_zero() {
                                        thread::sleep(self.settings.poll_interval);
                                    }
                                    LoopState::Polling
                                }
                                Verdict::Stop(reason) => LoopState::Stopped(reason),
                            }
                        }
                        Some(byte) => {
                            // Ask for the next byte before handling this one
                            self.pulse()?;
                            let (next, verdict) = session.advance(SessionEvent::ByteReceived(byte));
                            session = next;

                            self.output.write_all(&[byte]).map_err(LinkError::OutputWrite)?;
                            bytes_written += 1;
                            if byte == 0 {
                                zero_bytes += 1;
                            }
                            trace!("byte {} = {:#04x}", bytes_written, byte);

                            match verdict {
                                Verdict::Continue => LoopState::Polling,
                                Verdict::Stop(reason) => LoopState::Stopped(reason),
                            }
                        }
                    }
                }
                LoopState::Stopped(stop) => {
                    self.output.flush().map_err(LinkError::OutputWrite)?;
                    match stop {
                        StopReason::PollWatchdog => debug!("No byte after {} polls", self.settings.limits.poll_budget),
                        StopReason::TrailingZeros => {
                            debug!("{} trailing zero bytes", self.settings.limits.trailing_zero_budget)
                        }
                    }
                    info!("Wrote stop reader command");
                    return Ok(ReadSummary {
                        bytes_written,
                        zero_bytes,
                        empty_polls,
                        stop,
                    });
                }
            };
        }
    }

    fn pulse(&mut self) -> Result<()> {
        self.line.pulse_line(&mut self.transport, self.settings.pulse_hold)
    }
}
