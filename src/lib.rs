//! tapelink - serial bridge for handshake-driven paper tape equipment
//!
//! The reader will not send a byte until the host pulses a modem-control
//! line (DTR by default) low-high-low. `tapelink-read` drives that handshake
//! and decides when the tape has ended; `tapelink-punch` copies a file to
//! the line for the punch, which needs no handshake.
//!
//! # Quick Start
//!
//! ```text
//! tapelink-read  /dev/ttyUSB0 tape.bin     # 4800 baud, DTR handshake
//! tapelink-punch /dev/ttyUSB0 tape.bin     # 600 baud
//! ```
//!
//! # When does a read end?
//!
//! | Condition | Result |
//! |-----------|--------|
//! | 50 empty polls in a row | stop (dead line), even before any data |
//! | 50 zero bytes in a row after payload | stop (end of tape) |
//! | zero bytes before the first payload byte | preamble, never stops |
//!
//! Every byte received is written to the output, zeros included.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod punch;
pub mod reader;
pub mod serial;

pub use config::Config;
pub use error::{LinkError, Result};
