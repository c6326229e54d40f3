//! Serial line access.
//!
//! - **port**: the `Transport` seam, modem-control bitmap and the native
//!   `serialport`-backed implementation
//! - **control**: handshake control-line driver (get/set/pulse)
//! - **sim**: scripted device used for dry runs and tests
//!
//! # Architecture
//!
//! ```text
//! HandshakeReader / punch::transmit
//! ├── ControlLine  (one modem-control bit, re-read before every write)
//! └── Transport    (SerialTransport | SimulatedDevice)
//! ```

pub mod control;
pub mod port;
pub mod sim;

pub use control::{ControlLine, HandshakeSignal};
pub use port::{check_baud, settle, ModemLines, Transport, SUPPORTED_BAUD_RATES};
#[cfg(unix)]
pub use port::{open_transport, SerialTransport};
pub use sim::SimulatedDevice;
