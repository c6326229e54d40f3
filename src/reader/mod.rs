//! Tape reader: handshake-driven byte acquisition.
//!
//! - **policy**: pure stop/continue decisions (preamble, zero run, poll watchdog)
//! - **session**: the I/O loop that pulses the line and polls for bytes
//!
//! # Loop states
//!
//! ```text
//! Idle ──release line──▶ Priming ──pulse──▶ Polling ──stop──▶ Stopped
//!                                            │   ▲
//!                                            └───┘ byte: pulse + write
//!                                                  none: back off
//! ```

pub mod policy;
pub mod session;

pub use policy::{ReadSession, SessionEvent, SessionLimits, StopReason, Verdict};
pub use session::{HandshakeReader, ReadSummary, ReaderSettings};
