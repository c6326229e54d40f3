//! tapelink-read - pull a tape from the reader into a file
//!
//! Opens the line at the reader's baud rate, lets it settle, then drives the
//! DTR handshake until the tape ends or the reader goes quiet.

use std::env;
use std::process;

use tracing::info;

use tapelink::cli::{self, Command};
use tapelink::Config;

const PROGRAM: &str = "tapelink-read";

fn main() -> anyhow::Result<()> {
    let invocation = match cli::parse_args(env::args().skip(1)) {
        Ok(Command::Run(invocation)) => invocation,
        Ok(Command::Help) => {
            cli::print_usage(PROGRAM, "read a paper tape over a DTR handshake");
            process::exit(0);
        }
        Ok(Command::Version) => {
            cli::print_version(PROGRAM);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            cli::print_usage(PROGRAM, "read a paper tape over a DTR handshake");
            process::exit(1);
        }
    };

    let config = Config::load(invocation.config.as_deref())?;
    tapelink::logging::init(&config.log_level, config.log_file.as_deref());

    info!("serial port: {} file: {}", invocation.device, invocation.file.display());

    #[cfg(not(unix))]
    {
        anyhow::bail!("{} needs a Unix serial driver for modem-control access", PROGRAM);
    }

    #[cfg(unix)]
    {
        run(&invocation, &config)?;
    }

    Ok(())
}

#[cfg(unix)]
fn run(invocation: &cli::Invocation, config: &Config) -> anyhow::Result<()> {
    use std::fs::File;
    use std::io::BufWriter;
    use std::time::Duration;

    use tapelink::reader::{HandshakeReader, StopReason};
    use tapelink::serial;
    use tapelink::LinkError;

    let baud = serial::check_baud(config.reader.baud, config.strict_baud)?;
    let mut transport = serial::open_transport(&invocation.device, baud, Duration::ZERO)?;
    serial::settle(&mut transport, &invocation.device, config.reader.settle())?;
    info!("Opened serial port OK");

    let output = File::create(&invocation.file).map_err(|source| LinkError::FileOpen {
        path: invocation.file.clone(),
        source,
    })?;
    info!("Opened file OK");

    let mut reader = HandshakeReader::new(transport, BufWriter::new(output), config.reader.settings());
    let summary = reader.run()?;

    let reason = match summary.stop {
        StopReason::TrailingZeros => "end of tape",
        StopReason::PollWatchdog => "reader stopped answering",
    };
    info!(
        "Read {} bytes ({} payload) from {}: {}",
        summary.bytes_written,
        summary.payload_bytes(),
        invocation.device,
        reason
    );
    Ok(())
}
