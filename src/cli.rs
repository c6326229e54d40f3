//! Command line handling shared by both binaries.
//!
//! ```text
//! tapelink-read  [OPTIONS] <serial-device> <file>
//! tapelink-punch [OPTIONS] <serial-device> <file>
//! ```

use std::path::PathBuf;

/// Version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A fully parsed run request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub device: String,
    pub file: PathBuf,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Invocation),
    Help,
    Version,
}

/// Parse arguments (without the program name).
///
/// Exactly two positionals are required.
pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut positionals = Vec::new();
    let mut config = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "-c" | "--config" => match args.next() {
                Some(path) => config = Some(PathBuf::from(path)),
                None => return Err("Missing config file argument".to_string()),
            },
            "--" => positionals.extend(args.by_ref()),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("Unknown argument: {}", flag));
            }
            other => positionals.push(other.to_string()),
        }
    }

    if positionals.len() != 2 {
        return Err(format!("wrong number of arguments (expected 2, got {})", positionals.len()));
    }
    let file = PathBuf::from(positionals.pop().unwrap_or_default());
    let device = positionals.pop().unwrap_or_default();

    Ok(Command::Run(Invocation { device, file, config }))
}

pub fn print_version(program: &str) {
    eprintln!("{} {}", program, VERSION);
}

pub fn print_usage(program: &str, about: &str) {
    eprintln!("{} {} - {}", program, VERSION, about);
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <serial-device> <file>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Config file (default: ~/.tapelink/config.toml)");
    eprintln!("  -V, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TAPELINK_CONFIG       Config file, if --config is not given");
    eprintln!("  RUST_LOG              Log filter, overrides log_level");
}
