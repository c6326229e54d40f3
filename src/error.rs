//! Error types shared by the reader and punch paths.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Failed to configure serial port {path}: {source}")]
    Configuration {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported baud rate {0} (strict_baud is enabled)")]
    UnsupportedBaud(u32),

    #[error("Failed to query modem control lines: {0}")]
    HardwareQuery(#[source] io::Error),

    #[error("Failed to set modem control lines: {0}")]
    HardwareSet(#[source] io::Error),

    #[error("Failed to read one byte from serial port: {0}")]
    TransportRead(#[source] io::Error),

    #[error("Failed to write to serial port: {0}")]
    TransportWrite(#[source] io::Error),

    #[error("Failed to write one byte to file: {0}")]
    OutputWrite(#[source] io::Error),

    #[error("Failed to read from source file: {0}")]
    InputRead(#[source] io::Error),

    #[error("Failed to open file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LinkError>;
