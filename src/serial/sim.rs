//! Scripted stand-in for a tape reader.
//!
//! Behaves like the real device: a byte is only placed on the line after a
//! full pulse (assert then release) of the handshake output. Faults can be
//! injected on any of the transport operations.

use std::collections::VecDeque;
use std::io;

use super::control::HandshakeSignal;
use super::port::{ModemLines, Transport};

#[derive(Debug)]
pub struct SimulatedDevice {
    /// Bytes the device will hand out, one per pulse
    script: VecDeque<u8>,
    /// Bytes already on the line waiting to be read
    line: VecDeque<u8>,
    lines: ModemLines,
    signal: HandshakeSignal,
    /// Empty polls before a freshly requested byte shows up
    latency: usize,
    delay_remaining: usize,
    pulses: usize,
    polls: usize,
    sent: Vec<u8>,
    queries: usize,
    sets: usize,
    sends: usize,
    fail_queries_after: Option<usize>,
    fail_sets_after: Option<usize>,
    fail_reads_after: Option<usize>,
    fail_sends_after: Option<usize>,
}

impl SimulatedDevice {
    pub fn new(script: Vec<u8>) -> Self {
        Self {
            script: VecDeque::from(script),
            line: VecDeque::new(),
            lines: ModemLines::empty(),
            signal: HandshakeSignal::default(),
            latency: 0,
            delay_remaining: 0,
            pulses: 0,
            polls: 0,
            sent: Vec::new(),
            queries: 0,
            sets: 0,
            sends: 0,
            fail_queries_after: None,
            fail_sets_after: None,
            fail_reads_after: None,
            fail_sends_after: None,
        }
    }

    /// Start with the given modem-control bitmap
    pub fn with_lines(mut self, lines: ModemLines) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_signal(mut self, signal: HandshakeSignal) -> Self {
        self.signal = signal;
        self
    }

    /// Number of empty polls before each requested byte becomes readable
    pub fn with_latency(mut self, polls: usize) -> Self {
        self.latency = polls;
        self
    }

    /// Put bytes on the line without a handshake (line noise, stale data)
    pub fn queue_noise(&mut self, bytes: &[u8]) {
        self.line.extend(bytes.iter().copied());
    }

    pub fn fail_queries_after(&mut self, ok: usize) {
        self.fail_queries_after = Some(ok);
    }

    pub fn fail_sets_after(&mut self, ok: usize) {
        self.fail_sets_after = Some(ok);
    }

    pub fn fail_reads_after(&mut self, ok: usize) {
        self.fail_reads_after = Some(ok);
    }

    pub fn fail_sends_after(&mut self, ok: usize) {
        self.fail_sends_after = Some(ok);
    }

    pub fn lines(&self) -> ModemLines {
        self.lines
    }

    /// Completed handshake pulses seen so far
    pub fn pulses(&self) -> usize {
        self.pulses
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Bytes written to the line by the host
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Bytes the device has not handed out yet
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn injected(what: &str) -> io::Error {
        io::Error::new(io::ErrorKind::Other, format!("simulated {} failure", what))
    }

    fn exhausted(count: usize, limit: Option<usize>) -> bool {
        matches!(limit, Some(ok) if count >= ok)
    }
}

impl Transport for SimulatedDevice {
    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        if Self::exhausted(self.polls, self.fail_reads_after) {
            return Err(Self::injected("read"));
        }
        self.polls += 1;

        if self.line.is_empty() {
            return Ok(None);
        }
        if self.delay_remaining > 0 {
            self.delay_remaining -= 1;
            return Ok(None);
        }
        Ok(self.line.pop_front())
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        if Self::exhausted(self.sends, self.fail_sends_after) {
            return Err(Self::injected("write"));
        }
        self.sends += 1;
        self.sent.extend_from_slice(data);
        Ok(())
    }

    fn modem_lines(&mut self) -> io::Result<ModemLines> {
        if Self::exhausted(self.queries, self.fail_queries_after) {
            return Err(Self::injected("TIOCMGET"));
        }
        self.queries += 1;
        Ok(self.lines)
    }

    fn set_modem_lines(&mut self, lines: ModemLines) -> io::Result<()> {
        if Self::exhausted(self.sets, self.fail_sets_after) {
            return Err(Self::injected("TIOCMSET"));
        }
        self.sets += 1;

        let bit = self.signal.bit();
        let falling = self.lines.contains(bit) && !lines.contains(bit);
        self.lines = lines;

        if falling {
            self.pulses += 1;
            if let Some(byte) = self.script.pop_front() {
                self.line.push_back(byte);
                self.delay_remaining = self.latency;
            }
        }
        Ok(())
    }

    fn discard_buffers(&mut self) -> io::Result<()> {
        self.line.clear();
        self.delay_remaining = 0;
        Ok(())
    }
}
