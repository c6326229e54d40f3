//! tapelink-punch - send a file to the tape punch
//!
//! No handshake: every byte of the file is written to the line in order.

use std::env;
use std::process;

use tracing::info;

use tapelink::cli::{self, Command};
use tapelink::Config;

const PROGRAM: &str = "tapelink-punch";

fn main() -> anyhow::Result<()> {
    let invocation = match cli::parse_args(env::args().skip(1)) {
        Ok(Command::Run(invocation)) => invocation,
        Ok(Command::Help) => {
            cli::print_usage(PROGRAM, "punch a file to paper tape");
            process::exit(0);
        }
        Ok(Command::Version) => {
            cli::print_version(PROGRAM);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            cli::print_usage(PROGRAM, "punch a file to paper tape");
            process::exit(1);
        }
    };

    let config = Config::load(invocation.config.as_deref())?;
    tapelink::logging::init(&config.log_level, config.log_file.as_deref());

    info!("serial port: {} file: {}", invocation.device, invocation.file.display());

    #[cfg(not(unix))]
    {
        anyhow::bail!("{} needs a Unix serial driver", PROGRAM);
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

    use tapelink::serial;
    use tapelink::LinkError;

    let baud = serial::check_baud(config.punch.baud, config.strict_baud)?;
    let mut transport = serial::open_transport(&invocation.device, baud, config.punch.write_timeout())?;
    serial::settle(&mut transport, &invocation.device, config.punch.settle())?;
    info!("Opened serial port OK");

    let source = File::open(&invocation.file).map_err(|source| LinkError::FileOpen {
        path: invocation.file.clone(),
        source,
    })?;
    info!("Opened file OK");

    let summary = tapelink::punch::transmit(source, &mut transport)?;
    info!("Sent {} bytes to {}", summary.bytes_sent, invocation.device);
    Ok(())
}
