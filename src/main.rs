//! ESP build flags CLI
//!
//! Called by PlatformIO as an `extra_script`/`build_flags` command. Prints one
//! `-D` flag per line for the attached board.

use clap::Parser;
use esp_build_flags::config::DEFAULT_CONFIG_PATH;
use esp_build_flags::{
    resolve_flags, ConfigStore, DeviceError, DeviceIdentifier, Error, EspTool, FixedIdentifier,
    RawDocument, ToolPaths,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "esp-build-flags")]
#[command(about = "Per-board compiler definitions from config.toml", version)]
struct Cli {
    /// Print the parsed config document and exit (also accepted as `-dump`)
    #[arg(long)]
    dump: bool,

    /// Path to the config document
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// PlatformIO home directory (default: ~/.platformio)
    #[arg(long, env = "PLATFORMIO_CORE_DIR")]
    platformio_home: Option<PathBuf>,

    /// Seconds to wait for `esptool.py read_mac`
    #[arg(long, default_value_t = esp_build_flags::device::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Use this MAC address instead of asking the attached board
    #[arg(long)]
    mac: Option<String>,

    /// Debug logging on stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_tracing(cli.verbose);

    let result = if cli.dump {
        run_dump(&cli)
    } else {
        run_flags(&cli)
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(e.exit_code());
        }
    }
}

/// Accept the historical single-dash `-dump`.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| if arg == "-dump" { OsString::from("--dump") } else { arg })
        .collect()
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_dump(cli: &Cli) -> Result<String, Error> {
    let document = RawDocument::load(&cli.config)?;
    document.to_pretty().map_err(|e| {
        Error::Config(esp_build_flags::ConfigError::Parse(format!(
            "cannot render document: {}",
            e
        )))
    })
}

fn run_flags(cli: &Cli) -> Result<String, Error> {
    let store = ConfigStore::load(&cli.config)?;
    let device = device(cli)?;
    resolve_flags(&store, device.as_ref())
}

fn device(cli: &Cli) -> Result<Box<dyn DeviceIdentifier>, DeviceError> {
    if let Some(ref mac) = cli.mac {
        return Ok(Box::new(FixedIdentifier::new(mac.clone())));
    }

    let paths = match cli.platformio_home {
        Some(ref home) => ToolPaths::from_home(home),
        None => ToolPaths::default_location()?,
    };
    let tool = EspTool::new(paths, Duration::from_secs(cli.timeout_secs))?;
    Ok(Box::new(tool))
}
